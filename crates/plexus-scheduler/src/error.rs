// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// A discovery candidate could not be bound to a plugin
    #[error("Failed to bind plugin {plugin}: {reason}")]
    #[diagnostic(
        code(scheduler::plugin_bind),
        help("The candidate is skipped; check its kind and options in the discovery manifest")
    )]
    PluginBind {
        plugin: String,
        reason: String,
    },

    /// Discovery manifest could not be read or parsed
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("{suggestion}")
    )]
    InvalidConfig {
        message: String,
        suggestion: String,
    },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a PluginBind error
    pub fn plugin_bind(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PluginBind {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
