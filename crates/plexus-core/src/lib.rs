//! Plexus Core - Resource vectors for extended-resource scheduling
//!
//! This crate provides:
//! - `ResourceVector`, a CPU/memory/GPU/extended-device quantity with a
//!   tolerant partial order
//! - Kubernetes quantity parsing and resource-list ingestion
//! - Error types with miette diagnostics
//! - Serialization helpers

pub mod error;
pub mod resources;

// Re-export commonly used types
pub use error::{ResourceError, Result};
pub use resources::{
    ResourceQuantity, ResourceVector, CPU_RESOURCE_NAME, GPU_RESOURCE_NAME, MEMORY_RESOURCE_NAME,
};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};

/// Serialize a value to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ResourceError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from YAML (JSON is accepted too)
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        ResourceError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}
