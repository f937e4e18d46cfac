use crate::plugin::AssessmentPlugin;
use crate::registry::AssessmentRegistry;
use crate::types::Labels;
use plexus_core::{Node, Pod};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Plugins that handled the event
    pub delivered: usize,
    /// Plugins that panicked while handling it
    pub faulted: Vec<String>,
}

impl BroadcastReport {
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty()
    }
}

/// Fans node and workload lifecycle events out to every registered plugin.
///
/// Each plugin call runs behind its own unwind boundary, so one faulty
/// plugin cannot keep the event from the rest.
#[derive(Debug, Clone)]
pub struct LifecycleBroadcaster {
    registry: Arc<AssessmentRegistry>,
}

impl LifecycleBroadcaster {
    /// Create a broadcaster over a populated registry
    pub fn new(registry: Arc<AssessmentRegistry>) -> Self {
        Self { registry }
    }

    pub fn broadcast_node_added(&self, node_name: &str, labels: &Labels) -> BroadcastReport {
        self.fan_out("node_added", node_name, |p| p.on_node_added(node_name, labels))
    }

    pub fn broadcast_node_updated(&self, node_name: &str, labels: &Labels) -> BroadcastReport {
        self.fan_out("node_updated", node_name, |p| p.on_node_updated(node_name, labels))
    }

    pub fn broadcast_node_removed(&self, node_name: &str) -> BroadcastReport {
        self.fan_out("node_removed", node_name, |p| p.on_node_removed(node_name))
    }

    pub fn broadcast_workload_added(&self, node_name: &str, labels: &Labels) -> BroadcastReport {
        self.fan_out("workload_added", node_name, |p| {
            p.on_workload_added(node_name, labels)
        })
    }

    pub fn broadcast_workload_removed(&self, node_name: &str, labels: &Labels) -> BroadcastReport {
        self.fan_out("workload_removed", node_name, |p| {
            p.on_workload_removed(node_name, labels)
        })
    }

    /// Broadcast a node addition using the node's name and annotations
    pub fn node_added(&self, node: &Node) -> BroadcastReport {
        let labels = annotations(node.metadata.annotations.as_ref());
        self.broadcast_node_added(&node_name(node), &labels)
    }

    /// Broadcast a node update using the node's name and annotations
    pub fn node_updated(&self, node: &Node) -> BroadcastReport {
        let labels = annotations(node.metadata.annotations.as_ref());
        self.broadcast_node_updated(&node_name(node), &labels)
    }

    /// Broadcast a node removal
    pub fn node_removed(&self, node: &Node) -> BroadcastReport {
        self.broadcast_node_removed(&node_name(node))
    }

    /// Broadcast a pod landing on a node, passing the pod's annotations
    pub fn workload_added(&self, node: &Node, pod: &Pod) -> BroadcastReport {
        let labels = annotations(pod.metadata.annotations.as_ref());
        self.broadcast_workload_added(&node_name(node), &labels)
    }

    /// Broadcast a pod leaving a node, passing the pod's annotations
    pub fn workload_removed(&self, node: &Node, pod: &Pod) -> BroadcastReport {
        let labels = annotations(pod.metadata.annotations.as_ref());
        self.broadcast_workload_removed(&node_name(node), &labels)
    }

    fn fan_out<F>(&self, event: &str, node_name: &str, deliver: F) -> BroadcastReport
    where
        F: Fn(&dyn AssessmentPlugin),
    {
        let mut report = BroadcastReport::default();

        for plugin in self.registry.all() {
            let plugin = plugin.as_ref();
            match catch_unwind(AssertUnwindSafe(|| deliver(plugin))) {
                Ok(()) => report.delivered += 1,
                Err(panic) => {
                    error!(
                        "Plugin {} panicked handling {} for node {}: {}",
                        plugin.name(),
                        event,
                        node_name,
                        panic_message(panic.as_ref())
                    );
                    report.faulted.push(plugin.name().to_string());
                }
            }
        }

        debug!(
            "Broadcast {} for node {} to {} plugins ({} faulted)",
            event,
            node_name,
            report.delivered,
            report.faulted.len()
        );

        report
    }
}

fn node_name(node: &Node) -> String {
    node.metadata.name.clone().unwrap_or_default()
}

fn annotations(annotations: Option<&Labels>) -> Labels {
    annotations.cloned().unwrap_or_default()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
