//! Prometheus metrics for route advertisement

use crate::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector for one engine instance.
///
/// Each collector owns its registry, so several engines can run side by side
/// without sharing counters.
#[derive(Clone)]
pub struct AdvertiserMetrics {
    /// Current cache revision
    pub cache_revision: IntGauge,
    /// Number of keys in the cache
    pub cache_entries: IntGauge,
    /// Cache writes and deletes
    pub cache_mutations_total: IntCounterVec,
    /// Configuration range updates by category and outcome
    pub range_updates_total: IntCounterVec,
    /// Full resyncs performed
    pub resyncs_total: IntCounter,
    /// Distinct service-derived routes currently advertised
    pub advertised_service_routes: IntGauge,
    /// Snapshot publishes that failed, by sink
    pub sink_failures_total: IntCounterVec,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl AdvertiserMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let cache_revision = IntGauge::new("route_cache_revision", "Current route cache revision")?;

        let cache_entries = IntGauge::new("route_cache_entries", "Keys in the route cache")?;

        let cache_mutations_total = IntCounterVec::new(
            Opts::new("route_cache_mutations_total", "Route cache mutations by operation"),
            &["operation"],
        )?;

        let range_updates_total = IntCounterVec::new(
            Opts::new(
                "route_range_updates_total",
                "Range configuration updates by category and result",
            ),
            &["category", "result"],
        )?;

        let resyncs_total = IntCounter::new("route_resyncs_total", "Full route resyncs")?;

        let advertised_service_routes = IntGauge::new(
            "route_advertised_service_routes",
            "Distinct service-derived routes currently advertised",
        )?;

        let sink_failures_total = IntCounterVec::new(
            Opts::new("route_sink_failures_total", "Failed route snapshot publishes by sink"),
            &["sink"],
        )?;

        registry.register(Box::new(cache_revision.clone()))?;
        registry.register(Box::new(cache_entries.clone()))?;
        registry.register(Box::new(cache_mutations_total.clone()))?;
        registry.register(Box::new(range_updates_total.clone()))?;
        registry.register(Box::new(resyncs_total.clone()))?;
        registry.register(Box::new(advertised_service_routes.clone()))?;
        registry.register(Box::new(sink_failures_total.clone()))?;

        Ok(Self {
            cache_revision,
            cache_entries,
            cache_mutations_total,
            range_updates_total,
            resyncs_total,
            advertised_service_routes,
            sink_failures_total,
            registry,
        })
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_text_format_structure() {
        let metrics = AdvertiserMetrics::new().expect("Failed to create metrics");
        metrics.cache_mutations_total.with_label_values(&["write"]).inc();
        metrics
            .range_updates_total
            .with_label_values(&["external", "rejected"])
            .inc();

        let text = metrics.gather().expect("Failed to gather metrics");
        assert!(text.contains("# HELP"));
        assert!(text.contains("# TYPE"));
        assert!(text.contains("route_cache_mutations_total{operation=\"write\"} 1"));
        assert!(text.contains("route_range_updates_total"));
    }

    #[test]
    fn test_instances_do_not_share_counters() {
        let a = AdvertiserMetrics::new().unwrap();
        let b = AdvertiserMetrics::new().unwrap();
        a.resyncs_total.inc();
        assert_eq!(a.resyncs_total.get(), 1);
        assert_eq!(b.resyncs_total.get(), 0);

        let shared = a.clone();
        shared.resyncs_total.inc();
        assert_eq!(a.resyncs_total.get(), 2);
    }
}
