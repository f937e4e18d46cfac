//! Plexus Scheduler - Extended-resource scoring for node placement
//!
//! This crate provides:
//! - The `AssessmentPlugin` capability set and the registry binding one
//!   plugin per resource name
//! - Score aggregation with a sticky infeasibility sentinel
//! - Lifecycle broadcast of node and workload events to every plugin
//! - Plugin discovery from a YAML manifest and a catalog of factories

pub mod broadcast;
pub mod discovery;
pub mod error;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod score;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use broadcast::{BroadcastReport, LifecycleBroadcaster};
pub use discovery::{DiscoveryConfig, PluginCatalog, PluginFactory, PluginSpec};
pub use error::{Result, SchedulerError};
pub use plugin::AssessmentPlugin;
pub use registry::AssessmentRegistry;
pub use score::ScoreAggregator;
pub use types::{Assessment, Labels, NodeAssessment, INFEASIBLE_SCORE};
