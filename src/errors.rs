//! Error types for the crop advisor.
//!
//! `ValidationError` covers everything a caller can fix by changing the
//! request. `AdvisorError` wraps it together with the service-side failures so
//! the transport can tell "bad input" from "service misconfigured".

use crate::features::FeatureField;
use std::fmt;
use thiserror::Error;

/// One field outside its agronomic range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeViolation {
    pub field: FeatureField,
    pub value: f64,
    pub rule: String,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (got {})", self.rule, self.value)
    }
}

/// Rejections produced by the feature validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", join_fields(.fields))]
    MissingFields { fields: Vec<FeatureField> },

    #[error("Invalid data types. All parameters must be numbers.")]
    NonNumeric,

    #[error("Validation errors: {}", join_violations(.violations))]
    OutOfRange { violations: Vec<RangeViolation> },
}

impl ValidationError {
    /// Fields named by this error, in canonical order.
    pub fn fields(&self) -> Vec<FeatureField> {
        match self {
            ValidationError::MissingFields { fields } => fields.clone(),
            ValidationError::NonNumeric => Vec::new(),
            ValidationError::OutOfRange { violations } => {
                violations.iter().map(|v| v.field).collect()
            }
        }
    }
}

fn join_fields(fields: &[FeatureField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_violations(violations: &[RangeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for the recommendation pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Models not loaded: {reason}")]
    ModelUnavailable { reason: String },

    #[error("Failed to load model artifact '{artifact}': {message}")]
    ModelLoad { artifact: String, message: String },

    #[error("Inference failed: {message}")]
    Inference { message: String },

    #[error("Crop catalog error: {message}")]
    Catalog { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias used across the crate.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

impl AdvisorError {
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub fn model_load(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// True when the caller caused the failure and can fix it by resubmitting.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AdvisorError::Validation(_))
    }
}

impl From<candle_core::Error> for AdvisorError {
    fn from(err: candle_core::Error) -> Self {
        AdvisorError::inference(err.to_string())
    }
}

impl From<std::io::Error> for AdvisorError {
    fn from(err: std::io::Error) -> Self {
        AdvisorError::io("io_operation", err)
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::serialization("json_operation", err)
    }
}
