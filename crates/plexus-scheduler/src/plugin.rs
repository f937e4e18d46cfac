use crate::types::{Assessment, Labels};

/// Capability set every extended-resource assessment plugin provides.
///
/// One plugin is bound per resource name. Lifecycle hooks are notifications
/// only; their default implementations ignore the event. Plugins are shared
/// across scheduling threads, so any state they keep needs interior
/// mutability.
pub trait AssessmentPlugin: Send + Sync {
    /// Resource name this plugin assesses (e.g. `nvidia.com/gpu`)
    fn name(&self) -> &str;

    /// Called once after the plugin is bound, before any other hook
    fn initialize(&self) {}

    /// A node joined the cluster
    fn on_node_added(&self, _node_name: &str, _labels: &Labels) {}

    /// A node's labels or annotations changed
    fn on_node_updated(&self, _node_name: &str, _labels: &Labels) {}

    /// A node left the cluster
    fn on_node_removed(&self, _node_name: &str) {}

    /// A workload was placed on a node
    fn on_workload_added(&self, _node_name: &str, _labels: &Labels) {}

    /// A workload left a node
    fn on_workload_removed(&self, _node_name: &str, _labels: &Labels) {}

    /// Score how well `node_name` can supply `requested_units` of this resource.
    /// A negative score means the node cannot.
    fn assess(&self, node_name: &str, requested_units: u64) -> Assessment;
}
