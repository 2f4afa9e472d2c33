//! Approved address ranges per service address category

use crate::{Result, RouteError};
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;

/// The service address categories that can be gated by a range list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeCategory {
    External,
    Cluster,
    LoadBalancer,
}

impl RangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeCategory::External => "external",
            RangeCategory::Cluster => "cluster",
            RangeCategory::LoadBalancer => "loadbalancer",
        }
    }

    /// Whether each configured range also publishes a reject entry
    pub fn publishes_reject_entries(&self) -> bool {
        matches!(self, RangeCategory::External | RangeCategory::Cluster)
    }
}

impl fmt::Display for RangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RangeIndex keeps the currently approved CIDRs for each category.
///
/// Each category's list is only ever replaced as a whole. A candidate list
/// containing a single malformed entry is rejected and the previous list
/// stays in effect.
#[derive(Clone, Debug, Default)]
pub struct RangeIndex {
    external: Vec<IpNetwork>,
    cluster: Vec<IpNetwork>,
    load_balancer: Vec<IpNetwork>,
}

impl RangeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a full candidate list without touching the index
    pub fn parse<S: AsRef<str>>(category: RangeCategory, candidates: &[S]) -> Result<Vec<IpNetwork>> {
        candidates
            .iter()
            .map(|c| {
                let value = c.as_ref().trim();
                value
                    .parse::<IpNetwork>()
                    .map(|net| {
                        // Mask host bits; the prefix is already known to be valid.
                        IpNetwork::new(net.network(), net.prefix()).unwrap_or(net)
                    })
                    .map_err(|source| RouteError::InvalidCidr {
                        category,
                        value: value.to_string(),
                        source,
                    })
            })
            .collect()
    }

    /// Swap in a staged list, returning the list it replaced
    pub fn replace(&mut self, category: RangeCategory, staged: Vec<IpNetwork>) -> Vec<IpNetwork> {
        std::mem::replace(self.slot_mut(category), staged)
    }

    /// Parse and replace in one step; all-or-nothing
    pub fn update<S: AsRef<str>>(&mut self, category: RangeCategory, candidates: &[S]) -> Result<()> {
        let staged = Self::parse(category, candidates)?;
        self.replace(category, staged);
        Ok(())
    }

    /// Whether any range of the category contains the address
    pub fn covers(&self, category: RangeCategory, addr: IpAddr) -> bool {
        self.ranges(category).iter().any(|net| net.contains(addr))
    }

    pub fn is_empty(&self, category: RangeCategory) -> bool {
        self.ranges(category).is_empty()
    }

    pub fn ranges(&self, category: RangeCategory) -> &[IpNetwork] {
        match category {
            RangeCategory::External => &self.external,
            RangeCategory::Cluster => &self.cluster,
            RangeCategory::LoadBalancer => &self.load_balancer,
        }
    }

    fn slot_mut(&mut self, category: RangeCategory) -> &mut Vec<IpNetwork> {
        match category {
            RangeCategory::External => &mut self.external,
            RangeCategory::Cluster => &mut self.cluster,
            RangeCategory::LoadBalancer => &mut self.load_balancer,
        }
    }
}
