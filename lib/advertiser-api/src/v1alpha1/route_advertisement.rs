use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RouteAdvertisement holds the cluster-wide address ranges that nodes may
/// advertise on behalf of services with a local traffic policy
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "router.datum.net",
    version = "v1alpha1",
    kind = "RouteAdvertisement",
    plural = "routeadvertisements",
    derive = "Default",
)]
#[serde(rename_all = "camelCase")]
pub struct RouteAdvertisementSpec {
    /// Service cluster IP ranges. An empty list disables cluster IP
    /// advertisement entirely.
    #[serde(default, rename = "serviceClusterIPs")]
    pub service_cluster_ips: Vec<ServiceIPBlock>,

    /// Ranges that service external IPs must fall within to be advertised
    #[serde(default, rename = "serviceExternalIPs")]
    pub service_external_ips: Vec<ServiceIPBlock>,

    /// Ranges that load balancer ingress IPs must fall within to be advertised
    #[serde(default, rename = "serviceLoadBalancerIPs")]
    pub service_load_balancer_ips: Vec<ServiceIPBlock>,
}

/// A single CIDR block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[derive(Default)]
pub struct ServiceIPBlock {
    /// CIDR notation, e.g. "10.96.0.0/12" or "fd00:10:96::/112"
    pub cidr: String,
}

impl RouteAdvertisementSpec {
    /// Cluster IP ranges as plain CIDR strings
    pub fn cluster_cidrs(&self) -> Vec<String> {
        cidrs(&self.service_cluster_ips)
    }

    /// External IP ranges as plain CIDR strings
    pub fn external_cidrs(&self) -> Vec<String> {
        cidrs(&self.service_external_ips)
    }

    /// Load balancer IP ranges as plain CIDR strings
    pub fn load_balancer_cidrs(&self) -> Vec<String> {
        cidrs(&self.service_load_balancer_ips)
    }
}

fn cidrs(blocks: &[ServiceIPBlock]) -> Vec<String> {
    blocks.iter().map(|b| b.cidr.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn test_crd_identity() {
        let crd = RouteAdvertisement::crd();
        assert_eq!(crd.spec.group, "router.datum.net");
        assert_eq!(crd.spec.names.kind, "RouteAdvertisement");
        assert_eq!(crd.spec.names.plural, "routeadvertisements");
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(RouteAdvertisement::api_version(&()), "router.datum.net/v1alpha1");
    }

    #[test]
    fn test_spec_deserialize() {
        let yaml = r#"
serviceClusterIPs:
  - cidr: 10.96.0.0/12
serviceExternalIPs:
  - cidr: 45.12.0.0/16
  - cidr: 172.217.3.0/24
"#;
        let spec: RouteAdvertisementSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.cluster_cidrs(), vec!["10.96.0.0/12".to_string()]);
        assert_eq!(
            spec.external_cidrs(),
            vec!["45.12.0.0/16".to_string(), "172.217.3.0/24".to_string()]
        );
        assert!(spec.load_balancer_cidrs().is_empty());
    }

    #[test]
    fn test_spec_serialize_field_names() {
        let spec = RouteAdvertisementSpec {
            service_load_balancer_ips: vec![ServiceIPBlock {
                cidr: "172.217.4.0/24".to_string(),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["serviceLoadBalancerIPs"][0]["cidr"], "172.217.4.0/24");
        assert!(json["serviceClusterIPs"].as_array().unwrap().is_empty());
    }
}
