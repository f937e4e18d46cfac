//! Test doubles shared by the unit tests

use crate::plugin::AssessmentPlugin;
use crate::types::{Assessment, Labels};
use parking_lot::Mutex;

/// Plugin that returns a fixed assessment and records every call
pub struct StubPlugin {
    name: String,
    assessment: Assessment,
    panics: bool,
    calls: Mutex<Vec<String>>,
}

impl StubPlugin {
    pub fn new(name: &str, score: i64, annotations: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            assessment: Assessment::new(score, labels(annotations)),
            panics: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A plugin whose lifecycle hooks panic
    pub fn panicking(name: &str) -> Self {
        Self {
            panics: true,
            ..Self::new(name, 0, &[])
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        if self.panics {
            panic!("{} refused {}", self.name, call);
        }
        self.calls.lock().push(call);
    }
}

impl AssessmentPlugin for StubPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) {
        self.record("initialize".to_string());
    }

    fn on_node_added(&self, node_name: &str, _labels: &Labels) {
        self.record(format!("node_added:{node_name}"));
    }

    fn on_node_updated(&self, node_name: &str, _labels: &Labels) {
        self.record(format!("node_updated:{node_name}"));
    }

    fn on_node_removed(&self, node_name: &str) {
        self.record(format!("node_removed:{node_name}"));
    }

    fn on_workload_added(&self, node_name: &str, _labels: &Labels) {
        self.record(format!("workload_added:{node_name}"));
    }

    fn on_workload_removed(&self, node_name: &str, _labels: &Labels) {
        self.record(format!("workload_removed:{node_name}"));
    }

    fn assess(&self, node_name: &str, requested_units: u64) -> Assessment {
        self.calls
            .lock()
            .push(format!("assess:{node_name}:{requested_units}"));
        self.assessment.clone()
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
