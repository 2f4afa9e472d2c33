//! Publishing client: turns route claims into cache entries

use crate::cache::RouteCache;
use crate::cidr::RouteCidr;
use crate::keys::KeyLayout;
use crate::ledger::RefCountLedger;
use crate::metrics::AdvertiserMetrics;
use crate::range_index::{RangeCategory, RangeIndex};
use crate::Result;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// PublishingClient owns the range index, the published-key ledger and the
/// route cache.
///
/// Several sources may ask for the same store key: the route generator for
/// service routes, and each configured range category for its own ranges.
/// The cache entry is written when the first source asks for a key and
/// removed when the last one lets go.
///
/// Range updates only change what is allowed. Re-evaluating service routes
/// against the new ranges is the caller's job.
pub struct PublishingClient {
    layout: KeyLayout,
    ranges: RangeIndex,
    published: RefCountLedger<String>,
    cache: RouteCache,
    metrics: AdvertiserMetrics,
}

impl PublishingClient {
    pub fn new(layout: KeyLayout, metrics: AdvertiserMetrics) -> Self {
        Self {
            layout,
            ranges: RangeIndex::new(),
            published: RefCountLedger::new(),
            cache: RouteCache::new(),
            metrics,
        }
    }

    /// Store key for a route
    pub fn route_key(&self, route: &RouteCidr) -> String {
        self.layout.static_route(route)
    }

    /// Claim a key for a route; writes the cache on the first claim
    pub fn set(&mut self, key: String, route: &RouteCidr) {
        if self.published.require(key.clone()) {
            debug!("Publishing route {} under {}", route, key);
            self.write(key, route.to_string());
        }
    }

    /// Release a key; deletes the cache entry on the last release
    pub fn unset(&mut self, key: &str) {
        if self.published.release(&key.to_string()) {
            debug!("Withdrawing route {}", key);
            self.delete(key);
        }
    }

    pub fn on_external_ips_update<S: AsRef<str>>(&mut self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::External, cidrs)
    }

    pub fn on_cluster_ips_update<S: AsRef<str>>(&mut self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::Cluster, cidrs)
    }

    pub fn on_load_balancer_ips_update<S: AsRef<str>>(&mut self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::LoadBalancer, cidrs)
    }

    /// Replace one category's ranges and publish the difference.
    ///
    /// Nothing is touched unless every candidate parses.
    pub fn update_ranges<S: AsRef<str>>(&mut self, category: RangeCategory, cidrs: &[S]) -> Result<()> {
        let staged = match RangeIndex::parse(category, cidrs) {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Rejecting {} range update: {}", category, e);
                self.metrics
                    .range_updates_total
                    .with_label_values(&[category.as_str(), "rejected"])
                    .inc();
                return Err(e);
            }
        };

        let new_routes: BTreeSet<RouteCidr> = staged.iter().copied().map(RouteCidr::from_network).collect();
        let previous = self.ranges.replace(category, staged);
        let old_routes: BTreeSet<RouteCidr> = previous.into_iter().map(RouteCidr::from_network).collect();

        for route in old_routes.difference(&new_routes) {
            let key = self.route_key(route);
            self.unset(&key);
            if category.publishes_reject_entries() {
                let reject = self.layout.reject_cidr(route);
                self.delete(&reject);
            }
        }
        // A configured host-length range is advertised by every node, not only
        // by nodes with a local endpoint for a service behind it.
        for route in new_routes.difference(&old_routes) {
            let key = self.route_key(route);
            self.set(key, route);
            if category.publishes_reject_entries() {
                let reject = self.layout.reject_cidr(route);
                self.write(reject, route.to_string());
            }
        }

        info!(
            "Updated {} ranges: {:?}",
            category,
            new_routes.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
        self.metrics
            .range_updates_total
            .with_label_values(&[category.as_str(), "applied"])
            .inc();
        Ok(())
    }

    pub fn ranges(&self) -> &RangeIndex {
        &self.ranges
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Number of sources currently claiming a key
    pub fn published_count(&self, key: &str) -> usize {
        self.published.count(&key.to_string())
    }

    fn write(&mut self, key: String, value: String) {
        self.cache.write(key, value);
        self.record("write");
    }

    fn delete(&mut self, key: &str) {
        if self.cache.delete(key) {
            self.record("delete");
        }
    }

    fn record(&self, operation: &str) {
        self.metrics
            .cache_mutations_total
            .with_label_values(&[operation])
            .inc();
        self.metrics.cache_revision.set(self.cache.revision() as i64);
        self.metrics.cache_entries.set(self.cache.len() as i64);
    }
}
