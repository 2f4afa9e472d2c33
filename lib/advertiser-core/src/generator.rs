//! Route generator: keeps published routes in step with Services and Endpoints
//!
//! Every handler takes the engine lock, recomputes the affected service's
//! route set from scratch, diffs it against the previous set and pushes only
//! the difference to the publishing client. A handler finishes its whole
//! resolve/diff/publish cycle before the next one can start.

use crate::cidr::RouteCidr;
use crate::client::PublishingClient;
use crate::indexer::{ObjectIndexer, ServiceKey};
use crate::keys::KeyLayout;
use crate::ledger::RefCountLedger;
use crate::metrics::AdvertiserMetrics;
use crate::range_index::RangeCategory;
use crate::resolver::ServiceRouteResolver;
use crate::sink::RouteSnapshot;
use crate::{Result, RouteError};
use k8s_openapi::api::core::v1::{Endpoints, Service};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// RouteGenerator owns the object indexers and all advertisement state
pub struct RouteGenerator {
    node_name: String,
    services: Arc<dyn ObjectIndexer<Service>>,
    endpoints: Arc<dyn ObjectIndexer<Endpoints>>,
    state: Mutex<GeneratorState>,
    metrics: AdvertiserMetrics,
}

struct GeneratorState {
    // Routes each service currently contributes
    service_routes: HashMap<ServiceKey, BTreeSet<RouteCidr>>,
    // How many services contribute each route
    advertised: RefCountLedger<RouteCidr>,
    client: PublishingClient,
}

impl RouteGenerator {
    pub fn new(
        node_name: impl Into<String>,
        services: Arc<dyn ObjectIndexer<Service>>,
        endpoints: Arc<dyn ObjectIndexer<Endpoints>>,
        layout: KeyLayout,
        metrics: AdvertiserMetrics,
    ) -> Self {
        let client = PublishingClient::new(layout, metrics.clone());
        Self {
            node_name: node_name.into(),
            services,
            endpoints,
            state: Mutex::new(GeneratorState {
                service_routes: HashMap::new(),
                advertised: RefCountLedger::new(),
                client,
            }),
            metrics,
        }
    }

    pub fn on_service_add(&self, svc: &Service) {
        self.sync_service(svc);
    }

    pub fn on_service_update(&self, svc: &Service) {
        self.sync_service(svc);
    }

    pub fn on_service_delete(&self, svc: &Service) {
        let key = ServiceKey::of(svc);
        debug!("Service {} deleted", key);
        let mut state = self.state.lock();
        self.apply(&mut state, &key, BTreeSet::new());
    }

    pub fn on_endpoints_add(&self, ep: &Endpoints) {
        self.sync_endpoints(ep);
    }

    pub fn on_endpoints_update(&self, ep: &Endpoints) {
        self.sync_endpoints(ep);
    }

    pub fn on_endpoints_delete(&self, ep: &Endpoints) {
        let key = ServiceKey::of(ep);
        debug!("Endpoints {} deleted", key);
        let mut state = self.state.lock();
        self.apply(&mut state, &key, BTreeSet::new());
    }

    /// Re-derive routes for every known service against the current ranges
    pub fn resync_known_routes(&self) {
        let mut state = self.state.lock();
        self.resync_locked(&mut state);
    }

    /// Replace the external IP ranges and resync; nothing changes on error
    pub fn on_external_ips_update<S: AsRef<str>>(&self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::External, cidrs)
    }

    /// Replace the cluster IP ranges and resync; nothing changes on error
    pub fn on_cluster_ips_update<S: AsRef<str>>(&self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::Cluster, cidrs)
    }

    /// Replace the load balancer IP ranges and resync; nothing changes on error
    pub fn on_load_balancer_ips_update<S: AsRef<str>>(&self, cidrs: &[S]) -> Result<()> {
        self.update_ranges(RangeCategory::LoadBalancer, cidrs)
    }

    /// Replace the ranges of several categories, then resync once.
    ///
    /// Each category is applied on its own, so a malformed list leaves only its
    /// category unchanged. Returns the rejected updates.
    pub fn on_ranges_update<S: AsRef<str>>(&self, updates: &[(RangeCategory, &[S])]) -> Vec<RouteError> {
        let mut state = self.state.lock();
        let mut errors = Vec::new();
        for (category, cidrs) in updates {
            if let Err(e) = state.client.update_ranges(*category, cidrs) {
                errors.push(e);
            }
        }
        if errors.len() < updates.len() {
            self.resync_locked(&mut state);
        }
        errors
    }

    /// Run `f` against the publishing client under the engine lock.
    ///
    /// Range changes made this way are not followed by a resync.
    pub fn with_client<R>(&self, f: impl FnOnce(&mut PublishingClient) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state.client)
    }

    /// Routes a service currently contributes, if any
    pub fn service_routes(&self, key: &ServiceKey) -> Option<BTreeSet<RouteCidr>> {
        self.state.lock().service_routes.get(key).cloned()
    }

    /// Number of services contributing a route
    pub fn advertised_count(&self, route: &RouteCidr) -> usize {
        self.state.lock().advertised.count(route)
    }

    /// Number of sources claiming a store key
    pub fn published_count(&self, key: &str) -> usize {
        self.state.lock().client.published_count(key)
    }

    pub fn cache_value(&self, key: &str) -> Option<String> {
        self.state.lock().client.cache().get(key).map(str::to_string)
    }

    pub fn cache_snapshot(&self) -> BTreeMap<String, String> {
        self.state.lock().client.cache().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().client.cache().revision()
    }

    /// Cache contents and revision taken under one lock
    pub fn snapshot(&self) -> RouteSnapshot {
        let state = self.state.lock();
        let cache = state.client.cache();
        RouteSnapshot::new(cache.revision(), cache.snapshot())
    }

    /// Receiver notified on every cache revision
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.lock().client.cache().subscribe()
    }

    pub fn metrics(&self) -> &AdvertiserMetrics {
        &self.metrics
    }

    fn sync_service(&self, svc: &Service) {
        let key = ServiceKey::of(svc);
        let mut state = self.state.lock();
        let ep = self.endpoints.get(&key);
        let desired = self.resolve(&state, svc, ep.as_deref());
        self.apply(&mut state, &key, desired);
    }

    fn sync_endpoints(&self, ep: &Endpoints) {
        let key = ServiceKey::of(ep);
        let mut state = self.state.lock();
        let desired = match self.services.get(&key) {
            Some(svc) => self.resolve(&state, &svc, Some(ep)),
            None => {
                debug!("No service for endpoints {} yet", key);
                BTreeSet::new()
            }
        };
        self.apply(&mut state, &key, desired);
    }

    fn update_ranges<S: AsRef<str>>(&self, category: RangeCategory, cidrs: &[S]) -> Result<()> {
        let mut state = self.state.lock();
        state.client.update_ranges(category, cidrs)?;
        self.resync_locked(&mut state);
        Ok(())
    }

    fn resync_locked(&self, state: &mut GeneratorState) {
        let mut keys: BTreeSet<ServiceKey> = self.services.keys().into_iter().collect();
        keys.extend(state.service_routes.keys().cloned());
        debug!("Resyncing routes for {} services", keys.len());

        for key in keys {
            let desired = match self.services.get(&key) {
                Some(svc) => {
                    let ep = self.endpoints.get(&key);
                    self.resolve(state, &svc, ep.as_deref())
                }
                None => BTreeSet::new(),
            };
            self.apply(state, &key, desired);
        }
        self.metrics.resyncs_total.inc();
    }

    fn resolve(&self, state: &GeneratorState, svc: &Service, ep: Option<&Endpoints>) -> BTreeSet<RouteCidr> {
        ServiceRouteResolver::new(&self.node_name, state.client.ranges()).resolve(svc, ep)
    }

    /// Replace a service's route set and publish the difference
    fn apply(&self, state: &mut GeneratorState, key: &ServiceKey, desired: BTreeSet<RouteCidr>) {
        let previous = state.service_routes.remove(key).unwrap_or_default();

        if previous != desired {
            for route in previous.difference(&desired) {
                if state.advertised.release(route) {
                    let store_key = state.client.route_key(route);
                    state.client.unset(&store_key);
                }
            }
            for route in desired.difference(&previous) {
                if state.advertised.require(*route) {
                    let store_key = state.client.route_key(route);
                    state.client.set(store_key, route);
                }
            }
            info!(
                "Service {} now advertises {} routes (was {})",
                key,
                desired.len(),
                previous.len()
            );
            self.metrics
                .advertised_service_routes
                .set(state.advertised.len() as i64);
        }

        if !desired.is_empty() {
            state.service_routes.insert(key.clone(), desired);
        }
    }
}
