//! Route advertiser API types and CRDs for Kubernetes integration
//!
//! This library defines the custom resources read by the route advertiser:
//! - RouteAdvertisement: Cluster-wide CIDR allow-lists for service routes

pub mod v1alpha1;

pub use v1alpha1::{RouteAdvertisement, RouteAdvertisementSpec, ServiceIPBlock};
