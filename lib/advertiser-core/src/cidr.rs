//! Route prefixes and their store-key form

use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;

/// Address family of a route
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    /// Prefix length of a single-address route in this family
    pub fn host_prefix(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }
}

/// A single route: address plus prefix length.
///
/// Routes are never aggregated; two prefixes that overlap are distinct
/// routes. Ranges are stored with their host bits masked off so that
/// `192.168.0.5/16` and `192.168.0.0/16` name the same route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteCidr {
    addr: IpAddr,
    prefix: u8,
}

impl RouteCidr {
    /// Full-length route for one address (/32 or /128)
    pub fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix: AddressFamily::of(&addr).host_prefix(),
        }
    }

    /// Route covering a whole network, normalized to its network address
    pub fn from_network(net: IpNetwork) -> Self {
        Self {
            addr: net.network(),
            prefix: net.prefix(),
        }
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.addr)
    }

    pub fn is_host(&self) -> bool {
        self.prefix == self.family().host_prefix()
    }

    /// `addr-prefix`, the form used in store keys
    pub fn dashed(&self) -> String {
        format!("{}-{}", self.addr, self.prefix)
    }
}

impl fmt::Display for RouteCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_routes() {
        let v4 = RouteCidr::host("127.0.0.1".parse().unwrap());
        assert_eq!(v4.to_string(), "127.0.0.1/32");
        assert_eq!(v4.dashed(), "127.0.0.1-32");
        assert!(v4.is_host());

        let v6 = RouteCidr::host("::1".parse().unwrap());
        assert_eq!(v6.to_string(), "::1/128");
        assert_eq!(v6.family(), AddressFamily::V6);
    }

    #[test]
    fn test_network_is_masked() {
        let net: IpNetwork = "192.168.0.5/16".parse().unwrap();
        let route = RouteCidr::from_network(net);
        assert_eq!(route.to_string(), "192.168.0.0/16");
        assert!(!route.is_host());
        assert_eq!(
            route,
            RouteCidr::from_network("192.168.0.0/16".parse().unwrap())
        );
    }
}
