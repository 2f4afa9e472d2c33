//! Watch loops feeding cluster events into the route generator

use advertiser_api::RouteAdvertisement;
use advertiser_core::{RangeCategory, RouteGenerator};
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::{Api, Resource, ResourceExt};
use kube_runtime::reflector::{self, store::Writer};
use kube_runtime::watcher::{self, Config as WatcherConfig, Event};
use kube_runtime::WatchStreamExt;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives events for one kind of watched object
pub trait ObjectHandler<K>: Send + Sync {
    fn on_add(&self, obj: &K);
    fn on_update(&self, obj: &K);
    fn on_delete(&self, obj: &K);
    /// Called once the initial listing is complete and the index is populated
    fn on_resync(&self);
}

impl ObjectHandler<Service> for RouteGenerator {
    fn on_add(&self, obj: &Service) {
        self.on_service_add(obj);
    }

    fn on_update(&self, obj: &Service) {
        self.on_service_update(obj);
    }

    fn on_delete(&self, obj: &Service) {
        self.on_service_delete(obj);
    }

    fn on_resync(&self) {
        self.resync_known_routes();
    }
}

impl ObjectHandler<Endpoints> for RouteGenerator {
    fn on_add(&self, obj: &Endpoints) {
        self.on_endpoints_add(obj);
    }

    fn on_update(&self, obj: &Endpoints) {
        self.on_endpoints_update(obj);
    }

    fn on_delete(&self, obj: &Endpoints) {
        self.on_endpoints_delete(obj);
    }

    fn on_resync(&self) {
        self.resync_known_routes();
    }
}

/// Dispatch one reflected event.
///
/// Objects from the initial listing only reach the index once the listing
/// completes, so they are handled by the resync on `InitDone` rather than
/// one by one.
pub fn handle_event<K, H>(handler: &H, event: &Event<K>)
where
    K: Resource<DynamicType = ()>,
    H: ObjectHandler<K> + ?Sized,
{
    let kind = K::kind(&()).to_string();
    match event {
        Event::Apply(obj) => {
            debug!("{} {}/{} applied", kind, obj.namespace().unwrap_or_default(), obj.name_any());
            handler.on_update(obj);
        }
        Event::Delete(obj) => {
            debug!("{} {}/{} deleted", kind, obj.namespace().unwrap_or_default(), obj.name_any());
            handler.on_delete(obj);
        }
        Event::Init => {
            debug!("{} watcher initialized", kind);
        }
        Event::InitApply(_) => {}
        Event::InitDone => {
            info!("{} watcher initial sync complete", kind);
            handler.on_resync();
        }
    }
}

/// Watch every object of kind `K`, keep `writer` current and forward events
/// to `handler`.
///
/// Runs until the watch stream ends; watch errors are logged and retried
/// with backoff.
pub async fn watch_objects<K, H>(api: Api<K>, writer: Writer<K>, handler: Arc<H>)
where
    K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + serde::de::DeserializeOwned + 'static,
    H: ObjectHandler<K> + ?Sized,
{
    let kind = K::kind(&()).to_string();
    let stream = reflector::reflector(writer, watcher::watcher(api, WatcherConfig::default()))
        .default_backoff();
    info!("Starting {} watcher", kind);
    drive(stream, |event| handle_event(&*handler, &event), &kind).await;
    warn!("{} watcher stream ended", kind);
}

async fn drive<K, S, F>(stream: S, mut on_event: F, kind: &str)
where
    S: Stream<Item = Result<Event<K>, watcher::Error>>,
    F: FnMut(Event<K>),
{
    futures::pin_mut!(stream);
    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => on_event(event),
            Err(e) => warn!("{} watcher error: {}", kind, e),
        }
    }
}

/// Apply a RouteAdvertisement's ranges; `None` clears every category.
///
/// Each category is applied independently so one bad list does not block the
/// others.
pub fn apply_advertisement(generator: &RouteGenerator, advertisement: Option<&RouteAdvertisement>) {
    let (cluster, external, load_balancer) = match advertisement {
        Some(ad) => (
            ad.spec.cluster_cidrs(),
            ad.spec.external_cidrs(),
            ad.spec.load_balancer_cidrs(),
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    let errors = generator.on_ranges_update(&[
        (RangeCategory::Cluster, cluster.as_slice()),
        (RangeCategory::External, external.as_slice()),
        (RangeCategory::LoadBalancer, load_balancer.as_slice()),
    ]);
    for e in errors {
        warn!("Ignoring range update: {}", e);
    }
}

/// Tracks whether the named RouteAdvertisement exists across relists
#[derive(Debug, Default)]
struct AdvertisementState {
    seen_in_listing: bool,
}

impl AdvertisementState {
    fn handle(&mut self, generator: &RouteGenerator, event: Event<RouteAdvertisement>) {
        match event {
            Event::Apply(ad) => {
                info!("RouteAdvertisement {} applied", ad.name_any());
                apply_advertisement(generator, Some(&ad));
            }
            Event::Delete(ad) => {
                info!("RouteAdvertisement {} deleted, clearing ranges", ad.name_any());
                apply_advertisement(generator, None);
            }
            Event::Init => {
                self.seen_in_listing = false;
            }
            Event::InitApply(ad) => {
                self.seen_in_listing = true;
                info!("RouteAdvertisement {} listed", ad.name_any());
                apply_advertisement(generator, Some(&ad));
            }
            Event::InitDone => {
                if !self.seen_in_listing {
                    info!("No RouteAdvertisement found, advertising no ranges");
                    apply_advertisement(generator, None);
                }
            }
        }
    }
}

/// Watch the named RouteAdvertisement and push its ranges into `generator`
pub async fn watch_advertisement(api: Api<RouteAdvertisement>, name: String, generator: Arc<RouteGenerator>) {
    let config = WatcherConfig::default().fields(&format!("metadata.name={}", name));
    let stream = watcher::watcher(api, config).default_backoff();
    let mut state = AdvertisementState::default();

    info!("Starting RouteAdvertisement watcher for {}", name);
    drive(stream, |event| state.handle(&generator, event), "RouteAdvertisement").await;
    warn!("RouteAdvertisement watcher stream ended");
}
