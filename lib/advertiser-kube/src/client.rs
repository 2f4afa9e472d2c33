//! Kubernetes client for route advertiser resources

use advertiser_api::RouteAdvertisement;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::{Api, Client};

/// AdvertiserClient wraps the Kubernetes client for the resources the
/// advertiser watches
#[derive(Clone)]
pub struct AdvertiserClient {
    client: Client,
}

impl AdvertiserClient {
    /// Create a client from the ambient kubeconfig or in-cluster config
    pub async fn new() -> anyhow::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Services across all namespaces
    pub fn services(&self) -> Api<Service> {
        Api::all(self.client.clone())
    }

    /// Endpoints across all namespaces
    pub fn endpoints(&self) -> Api<Endpoints> {
        Api::all(self.client.clone())
    }

    /// Cluster-scoped RouteAdvertisement objects
    pub fn advertisements(&self) -> Api<RouteAdvertisement> {
        Api::all(self.client.clone())
    }
}
