// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for resource accounting
#[derive(Error, Debug, Diagnostic)]
pub enum ResourceError {
    /// Subtraction would drive a dimension below what the minuend holds
    #[error("Resource is not sufficient to do operation: <{minuend}> sub <{subtrahend}>")]
    #[diagnostic(
        code(plexus::insufficient_resource),
        help("Check `less_equal` against the minuend before subtracting")
    )]
    InsufficientResource {
        #[allow(unused)]
        minuend: String,
        #[allow(unused)]
        subtrahend: String,
    },

    /// Lookup of a dimension the vector does not carry
    #[error("Unknown resource dimension: {name}")]
    #[diagnostic(
        code(plexus::unknown_dimension),
        help("Use `is_zero` for dimensions that may be absent, it treats them as zero")
    )]
    UnknownDimension {
        #[allow(unused)]
        name: String,
    },

    /// Quantity string could not be parsed
    #[error("Invalid quantity '{value}' for {resource}: {reason}")]
    #[diagnostic(
        code(plexus::invalid_quantity),
        help("Use a Kubernetes quantity such as '500m', '2', '1.5', '128Mi' or '1e3'")
    )]
    InvalidQuantity {
        #[allow(unused)]
        resource: String,
        #[allow(unused)]
        value: String,
        #[allow(unused)]
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(plexus::serialization_error),
        help("Ensure the input is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for resource operations
pub type Result<T> = std::result::Result<T, ResourceError>;

impl ResourceError {
    /// Create an InsufficientResource error
    pub fn insufficient_resource(
        minuend: impl Into<String>,
        subtrahend: impl Into<String>,
    ) -> Self {
        Self::InsufficientResource {
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }

    /// Create an UnknownDimension error
    pub fn unknown_dimension(name: impl Into<String>) -> Self {
        Self::UnknownDimension { name: name.into() }
    }

    /// Create an InvalidQuantity error
    pub fn invalid_quantity(
        resource: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidQuantity {
            resource: resource.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}
