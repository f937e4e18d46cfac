use super::{ResourceQuantity, ResourceVector};
use crate::error::Result;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

impl ResourceVector {
    /// Build a vector from a k8s resource list (`allocatable`, `requests`, ...)
    pub fn from_resource_list(resources: &BTreeMap<String, Quantity>) -> Result<Self> {
        let mut parsed = Vec::with_capacity(resources.len());
        for (name, q) in resources {
            parsed.push((name.as_str(), ResourceQuantity::parse_for(name, &q.0)?));
        }

        Ok(Self::from_quantities(parsed))
    }

    /// Node allocatable resources. A node without status reports nothing.
    pub fn from_node_allocatable(node: &Node) -> Result<Self> {
        match node.status.as_ref().and_then(|s| s.allocatable.as_ref()) {
            Some(allocatable) => Self::from_resource_list(allocatable),
            None => Ok(Self::empty()),
        }
    }

    /// Total resources requested by every container in the pod
    pub fn from_pod_requests(pod: &Pod) -> Result<Self> {
        let mut total = Self::empty();

        let Some(spec) = &pod.spec else {
            return Ok(total);
        };

        for container in &spec.containers {
            if let Some(requests) = container
                .resources
                .as_ref()
                .and_then(|r| r.requests.as_ref())
            {
                total.add(&Self::from_resource_list(requests)?);
            }
        }

        Ok(total)
    }
}
