//! Store key layout read by the routing daemon

use crate::cidr::{AddressFamily, RouteCidr};

const STATIC_ROUTES_V4: &str = "staticroutes";
const STATIC_ROUTES_V6: &str = "staticroutesv6";
const REJECT_CIDRS_V4: &str = "rejectcidrs";
const REJECT_CIDRS_V6: &str = "rejectcidrsv6";

/// KeyLayout derives store keys from routes.
///
/// Keys are a function of address family and key kind only, so the same
/// prefix always maps to the same key regardless of which source wants it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    /// A layout rooted at `prefix` (e.g. "/calico"); empty for bare keys
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// `staticroutes/<addr>-<len>` or `staticroutesv6/<addr>-<len>`
    pub fn static_route(&self, route: &RouteCidr) -> String {
        let namespace = match route.family() {
            AddressFamily::V4 => STATIC_ROUTES_V4,
            AddressFamily::V6 => STATIC_ROUTES_V6,
        };
        self.join(namespace, route)
    }

    /// `rejectcidrs/<addr>-<len>` or `rejectcidrsv6/<addr>-<len>`
    pub fn reject_cidr(&self, route: &RouteCidr) -> String {
        let namespace = match route.family() {
            AddressFamily::V4 => REJECT_CIDRS_V4,
            AddressFamily::V6 => REJECT_CIDRS_V6,
        };
        self.join(namespace, route)
    }

    fn join(&self, namespace: &str, route: &RouteCidr) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}", namespace, route.dashed())
        } else {
            format!("{}/{}/{}", self.prefix, namespace, route.dashed())
        }
    }
}
