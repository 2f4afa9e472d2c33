//! Derives the routes a node must advertise for a single service

use crate::cidr::{AddressFamily, RouteCidr};
use crate::endpoint::has_local_endpoint;
use crate::range_index::{RangeCategory, RangeIndex};
use k8s_openapi::api::core::v1::{Endpoints, Service, ServiceSpec};
use std::collections::BTreeSet;
use std::net::IpAddr;

const TYPE_CLUSTER_IP: &str = "ClusterIP";
const TYPE_LOAD_BALANCER: &str = "LoadBalancer";
const POLICY_LOCAL: &str = "Local";
const CLUSTER_IP_NONE: &str = "None";

/// ServiceRouteResolver maps a Service and its Endpoints to host routes.
///
/// Resolution reads the range index but never changes it; the same inputs
/// always produce the same set.
pub struct ServiceRouteResolver<'a> {
    node_name: &'a str,
    ranges: &'a RangeIndex,
}

impl<'a> ServiceRouteResolver<'a> {
    pub fn new(node_name: &'a str, ranges: &'a RangeIndex) -> Self {
        Self { node_name, ranges }
    }

    /// Compute the full route set for a service on this node
    pub fn resolve(&self, service: &Service, endpoints: Option<&Endpoints>) -> BTreeSet<RouteCidr> {
        let mut routes = BTreeSet::new();

        let Some(spec) = service.spec.as_ref() else {
            return routes;
        };
        if !is_eligible_type(spec) {
            return routes;
        }
        // Headless services have no virtual address to route to.
        let Some(primary) = primary_cluster_ip(spec) else {
            return routes;
        };
        if spec.external_traffic_policy.as_deref() != Some(POLICY_LOCAL) {
            return routes;
        }
        let family = primary.parse::<IpAddr>().ok().map(|ip| AddressFamily::of(&ip));
        match endpoints {
            Some(ep) if has_local_endpoint(ep, self.node_name, family) => {}
            _ => return routes,
        }

        if !self.ranges.is_empty(RangeCategory::Cluster) {
            routes.extend(
                cluster_ips(spec)
                    .filter_map(parse_addr)
                    .map(RouteCidr::host),
            );
        }

        routes.extend(
            spec.external_ips
                .iter()
                .flatten()
                .filter_map(|ip| parse_addr(ip))
                .filter(|ip| self.ranges.covers(RangeCategory::External, *ip))
                .map(RouteCidr::host),
        );

        if spec.type_.as_deref() == Some(TYPE_LOAD_BALANCER) {
            routes.extend(
                load_balancer_ingress_ips(service)
                    .filter_map(parse_addr)
                    .filter(|ip| self.ranges.covers(RangeCategory::LoadBalancer, *ip))
                    .map(RouteCidr::host),
            );
        }

        routes
    }
}

fn is_eligible_type(spec: &ServiceSpec) -> bool {
    matches!(
        spec.type_.as_deref().unwrap_or(TYPE_CLUSTER_IP),
        TYPE_CLUSTER_IP | TYPE_LOAD_BALANCER
    )
}

fn primary_cluster_ip(spec: &ServiceSpec) -> Option<&str> {
    let primary = spec
        .cluster_ip
        .as_deref()
        .filter(|ip| !ip.is_empty())
        .or_else(|| spec.cluster_ips.iter().flatten().next().map(String::as_str))?;
    (primary != CLUSTER_IP_NONE && !primary.is_empty()).then_some(primary)
}

fn cluster_ips(spec: &ServiceSpec) -> impl Iterator<Item = &str> {
    let all: Vec<&str> = match spec.cluster_ips.as_deref() {
        Some(ips) if !ips.is_empty() => ips.iter().map(String::as_str).collect(),
        _ => spec.cluster_ip.as_deref().into_iter().collect(),
    };
    all.into_iter()
}

fn load_balancer_ingress_ips(service: &Service) -> impl Iterator<Item = &str> {
    service
        .status
        .iter()
        .filter_map(|status| status.load_balancer.as_ref())
        .flat_map(|lb| lb.ingress.iter().flatten())
        .filter_map(|ingress| ingress.ip.as_deref())
}

fn parse_addr(s: &str) -> Option<IpAddr> {
    s.parse().ok()
}
