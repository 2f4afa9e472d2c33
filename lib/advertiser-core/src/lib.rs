//! Route advertisement engine
//!
//! This library provides:
//! - CIDR range indexes for the cluster, external and load balancer categories
//! - Per-service route resolution against the local node's endpoints
//! - Reference-counted publication of routes into a revisioned cache
//! - Snapshot sinks for consumers of the cache

pub mod cache;
pub mod cidr;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod generator;
pub mod indexer;
pub mod keys;
pub mod ledger;
pub mod metrics;
pub mod range_index;
pub mod resolver;
pub mod sink;

pub use cache::RouteCache;
pub use cidr::{AddressFamily, RouteCidr};
pub use client::PublishingClient;
pub use error::{Result, RouteError};
pub use generator::RouteGenerator;
pub use indexer::{MemoryIndexer, ObjectIndexer, ServiceKey};
pub use keys::KeyLayout;
pub use metrics::AdvertiserMetrics;
pub use range_index::{RangeCategory, RangeIndex};
pub use sink::{run_publisher, FileSink, RouteSink, RouteSnapshot};
