//! Endpoint locality checks

use crate::cidr::AddressFamily;
use k8s_openapi::api::core::v1::{EndpointAddress, Endpoints};
use std::net::IpAddr;

/// Whether an Endpoints object has at least one ready address on `node_name`.
///
/// When `family` is given, a local address that carries an IP only counts if
/// it belongs to that family. Addresses without an IP count on node match
/// alone.
pub fn has_local_endpoint(
    endpoints: &Endpoints,
    node_name: &str,
    family: Option<AddressFamily>,
) -> bool {
    endpoints
        .subsets
        .iter()
        .flatten()
        .flat_map(|subset| subset.addresses.iter().flatten())
        .any(|address| is_local(address, node_name) && matches_family(address, family))
}

fn is_local(address: &EndpointAddress, node_name: &str) -> bool {
    address.node_name.as_deref() == Some(node_name)
}

fn matches_family(address: &EndpointAddress, family: Option<AddressFamily>) -> bool {
    let (Some(family), false) = (family, address.ip.is_empty()) else {
        return true;
    };
    match address.ip.parse::<IpAddr>() {
        Ok(ip) => AddressFamily::of(&ip) == family,
        Err(_) => false,
    }
}
