//! Route sinks: deliver cache snapshots to consumers outside the process

use crate::error::RouteError;
use crate::generator::RouteGenerator;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Point-in-time copy of the route cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSnapshot {
    pub revision: u64,
    pub generated_at: DateTime<Utc>,
    pub routes: BTreeMap<String, String>,
}

impl RouteSnapshot {
    pub fn new(revision: u64, routes: BTreeMap<String, String>) -> Self {
        Self {
            revision,
            generated_at: Utc::now(),
            routes,
        }
    }
}

/// Destination for route snapshots
#[async_trait::async_trait]
pub trait RouteSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, snapshot: &RouteSnapshot) -> Result<()>;
}

/// Writes each snapshot as JSON, replacing the previous file atomically
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn store_error(&self, source: std::io::Error) -> RouteError {
        RouteError::Store {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl RouteSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn publish(&self, snapshot: &RouteSnapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, &body)
            .await
            .map_err(|e| self.store_error(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.store_error(e))?;

        debug!(
            "Wrote {} routes at revision {} to {}",
            snapshot.routes.len(),
            snapshot.revision,
            self.path.display()
        );
        Ok(())
    }
}

/// Publish a snapshot on every cache revision. Runs until the task is aborted.
///
/// Revisions that arrive while a publish is in flight are coalesced into the
/// next snapshot.
pub async fn run_publisher(generator: Arc<RouteGenerator>, sink: Arc<dyn RouteSink>) {
    let mut revisions = generator.subscribe();
    info!("Starting {} route publisher", sink.name());

    loop {
        revisions.borrow_and_update();
        let snapshot = generator.snapshot();
        if let Err(e) = sink.publish(&snapshot).await {
            error!("Failed to publish routes to {} sink: {}", sink.name(), e);
            generator
                .metrics()
                .sink_failures_total
                .with_label_values(&[sink.name()])
                .inc();
        }

        if revisions.changed().await.is_err() {
            info!("Route cache closed, stopping {} publisher", sink.name());
            return;
        }
    }
}
