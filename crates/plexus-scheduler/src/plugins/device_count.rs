use crate::plugin::AssessmentPlugin;
use crate::types::{Assessment, Labels};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Whole-device bookkeeping for one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NodeDevices {
    capacity: u64,
    used: u64,
}

impl NodeDevices {
    fn free(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }
}

/// Counts whole devices of a single extended resource per node.
///
/// Node capacity is read from the node annotation `<resource>/capacity`;
/// each workload consumes the count in its `<resource>/count` annotation.
/// Scores follow least-allocated: the larger the share of devices left free
/// after placement, the higher the score (0-100).
pub struct DeviceCountPlugin {
    resource_name: String,
    capacity_key: String,
    count_key: String,
    nodes: RwLock<HashMap<String, NodeDevices>>,
}

impl DeviceCountPlugin {
    /// Create a plugin for `resource_name`
    pub fn new(resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        Self {
            capacity_key: format!("{}/capacity", resource_name),
            count_key: format!("{}/count", resource_name),
            resource_name,
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Devices currently free on `node_name`, if the node is known
    pub fn free_devices(&self, node_name: &str) -> Option<u64> {
        self.nodes.read().get(node_name).map(NodeDevices::free)
    }

    fn parse_count(&self, labels: &Labels, key: &str, node_name: &str) -> Option<u64> {
        let raw = labels.get(key)?;
        match raw.trim().parse::<u64>() {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(
                    "Ignoring {}={:?} on node {}: {}",
                    key, raw, node_name, e
                );
                None
            }
        }
    }

    fn set_capacity(&self, node_name: &str, labels: &Labels) {
        let Some(capacity) = self.parse_count(labels, &self.capacity_key, node_name) else {
            return;
        };

        let mut nodes = self.nodes.write();
        nodes.entry(node_name.to_string()).or_default().capacity = capacity;
        debug!(
            "Node {} advertises {} x {}",
            node_name, capacity, self.resource_name
        );
    }
}

impl AssessmentPlugin for DeviceCountPlugin {
    fn name(&self) -> &str {
        &self.resource_name
    }

    fn initialize(&self) {
        self.nodes.write().clear();
    }

    fn on_node_added(&self, node_name: &str, labels: &Labels) {
        self.set_capacity(node_name, labels);
    }

    fn on_node_updated(&self, node_name: &str, labels: &Labels) {
        self.set_capacity(node_name, labels);
    }

    fn on_node_removed(&self, node_name: &str) {
        self.nodes.write().remove(node_name);
    }

    fn on_workload_added(&self, node_name: &str, labels: &Labels) {
        let Some(count) = self.parse_count(labels, &self.count_key, node_name) else {
            return;
        };

        let mut nodes = self.nodes.write();
        let devices = nodes.entry(node_name.to_string()).or_default();
        devices.used = devices.used.saturating_add(count);
    }

    fn on_workload_removed(&self, node_name: &str, labels: &Labels) {
        let Some(count) = self.parse_count(labels, &self.count_key, node_name) else {
            return;
        };

        if let Some(devices) = self.nodes.write().get_mut(node_name) {
            devices.used = devices.used.saturating_sub(count);
        }
    }

    fn assess(&self, node_name: &str, requested_units: u64) -> Assessment {
        let nodes = self.nodes.read();
        let Some(devices) = nodes.get(node_name) else {
            return Assessment::infeasible();
        };

        let free = devices.free();
        if requested_units > free || devices.capacity == 0 {
            return Assessment::infeasible();
        }

        let remaining = free - requested_units;
        let score = (remaining.saturating_mul(100) / devices.capacity) as i64;

        let mut annotations = Labels::new();
        annotations.insert(format!("{}/free", self.resource_name), remaining.to_string());

        Assessment::new(score, annotations)
    }
}
