/// API version v1alpha1 for route advertiser CRDs

pub mod route_advertisement;

pub use route_advertisement::{RouteAdvertisement, RouteAdvertisementSpec, ServiceIPBlock};

/// API group for route advertiser resources
pub const API_GROUP: &str = "router.datum.net";
/// API version for route advertiser resources
pub const API_VERSION: &str = "v1alpha1";
/// Name of the RouteAdvertisement object read when none is configured
pub const DEFAULT_ADVERTISEMENT_NAME: &str = "default";
