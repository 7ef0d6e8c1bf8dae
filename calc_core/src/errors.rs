//! # Error Types
//!
//! Structured error types for calc_core. Three kinds come out of a
//! calculation (validation, transport, computation); the rest belong to the
//! history persistence layer.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn require_operand(text: &str) -> CalcResult<f64> {
//!     text.trim()
//!         .parse()
//!         .map_err(|_| CalcError::validation("Please enter a valid number"))
//! }
//!
//! assert!(require_operand("abc").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Message shown to the user when the compute service cannot be reached
/// or answers with something unreadable.
pub const TRANSPORT_MESSAGE: &str = "An error occurred. Please try again.";

/// Structured error type for calculator operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// Local input is missing or not a number. Raised before any request is sent.
    #[error("{message}")]
    Validation { message: String },

    /// The request never completed or the response could not be understood.
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// The compute service rejected the calculation (divide by zero, domain error...).
    #[error("{message}")]
    Computation { message: String },

    /// Durable storage failed
    #[error("Storage error: {operation} on '{key}' - {reason}")]
    Storage {
        operation: String,
        key: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Persisted history was written by an incompatible schema
    #[error("Version mismatch: stored version {stored_version}, expected {expected_version}")]
    VersionMismatch {
        stored_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        CalcError::Validation {
            message: message.into(),
        }
    }

    /// Create a Transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        CalcError::Transport {
            reason: reason.into(),
        }
    }

    /// Create a Computation error
    pub fn computation(message: impl Into<String>) -> Self {
        CalcError::Computation {
            message: message.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(operation: impl Into<String>, key: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Storage {
            operation: operation.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a Serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::Serialization {
            reason: reason.into(),
        }
    }

    /// Text for the inline error banner.
    ///
    /// Transport failures collapse to a generic retry hint; the cause stays
    /// in the error (and the logs) for diagnostics.
    pub fn user_message(&self) -> String {
        match self {
            CalcError::Validation { message } | CalcError::Computation { message } => message.clone(),
            CalcError::Transport { .. } => TRANSPORT_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::Transport { .. } => "TRANSPORT_ERROR",
            CalcError::Computation { .. } => "COMPUTATION_ERROR",
            CalcError::Storage { .. } => "STORAGE_ERROR",
            CalcError::Serialization { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::serialization(e.to_string())
    }
}
