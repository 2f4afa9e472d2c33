//! Kubernetes integration for the route advertiser
//!
//! This library provides:
//! - A client wrapper for the resources the advertiser reads
//! - Reflector-backed object indexers
//! - Watch loops that feed Service, Endpoints and RouteAdvertisement events
//!   into a route generator

pub mod client;
pub mod indexer;
pub mod watcher;

pub use client::AdvertiserClient;
pub use indexer::ReflectorIndexer;
pub use watcher::{watch_advertisement, watch_objects, ObjectHandler};
