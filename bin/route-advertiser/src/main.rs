use advertiser_core::{run_publisher, AdvertiserMetrics, FileSink, KeyLayout, RouteGenerator};
use advertiser_kube::{watch_advertisement, watch_objects, AdvertiserClient, ReflectorIndexer};
use anyhow::Result;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube_runtime::reflector;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod server;

use config::{AdvertiserConfig, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AdvertiserConfig::load()?;
    init_tracing(config.log_format);

    info!("Starting route-advertiser on node {}...", config.node_name);

    let client = AdvertiserClient::new().await?;
    let metrics = AdvertiserMetrics::new()?;

    let (service_store, service_writer) = reflector::store::<Service>();
    let (endpoints_store, endpoints_writer) = reflector::store::<Endpoints>();

    let generator = Arc::new(RouteGenerator::new(
        config.node_name.clone(),
        Arc::new(ReflectorIndexer::new(service_store)),
        Arc::new(ReflectorIndexer::new(endpoints_store)),
        KeyLayout::new(config.key_prefix.clone()),
        metrics.clone(),
    ));
    info!("Route generator initialized");

    tokio::spawn(watch_advertisement(
        client.advertisements(),
        config.config_name.clone(),
        generator.clone(),
    ));
    tokio::spawn(watch_objects(client.services(), service_writer, generator.clone()));
    tokio::spawn(watch_objects(client.endpoints(), endpoints_writer, generator.clone()));

    match &config.snapshot_path {
        Some(path) => {
            info!("Writing route snapshots to {}", path.display());
            tokio::spawn(run_publisher(generator.clone(), Arc::new(FileSink::new(path))));
        }
        None => info!("Snapshot path not set, routes are kept in memory only"),
    }

    let metrics_addr = config.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = server::serve(metrics_addr, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}
