//! Error types for the logging pipeline
//!
//! Nothing in this crate lets an error escape into request handling: the
//! provider swallows every [`LogError`] after reporting it through its
//! fallback channel. The types still exist so sinks and redaction patterns can
//! say *what* went wrong, and so that report is useful.
//!
//! # Example
//! ```rust
//! use reqlog::{LogError, LogErrorCode};
//!
//! let error = LogError::sink("disk full");
//! assert_eq!(error.code, LogErrorCode::SinkFailure);
//! assert_eq!(error.to_string(), "[SINK_FAILURE] disk full");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Categories of failure inside the logging pipeline.
///
/// Serialized as SCREAMING_SNAKE_CASE (e.g. `SinkFailure` becomes
/// `"SINK_FAILURE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum LogErrorCode {
    /// A redaction pattern failed for a sensitive field
    RedactionFailure,
    /// The sink rejected or failed to write a record
    SinkFailure,
    /// A record could not be serialized
    SerializationError,
    /// Configuration failed validation
    InvalidConfig,
    /// A global subscriber could not be installed
    InitFailure,
}

impl LogErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedactionFailure => "REDACTION_FAILURE",
            Self::SinkFailure => "SINK_FAILURE",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InitFailure => "INIT_FAILURE",
        }
    }
}

impl fmt::Display for LogErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error raised inside the logging pipeline.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct LogError {
    /// Error category
    pub code: LogErrorCode,
    /// Human-readable description
    pub message: String,
    /// Field being processed when the error occurred, if any
    pub field: Option<String>,
}

impl LogError {
    /// Create a new error with code and message.
    pub fn new(code: LogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Attach the field name the error relates to.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// A redaction pattern failed.
    pub fn redaction(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogErrorCode::RedactionFailure, message).with_field(field)
    }

    /// A sink failed to accept a record.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::new(LogErrorCode::SinkFailure, message)
    }

    /// A record could not be serialized.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(LogErrorCode::SerializationError, message)
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        Self::sink(err.to_string())
    }
}

impl From<ConfigValidationError> for LogError {
    fn from(err: ConfigValidationError) -> Self {
        Self::new(LogErrorCode::InvalidConfig, err.to_string())
    }
}

/// Result type for logging operations.
pub type LogResult<T> = Result<T, LogError>;

/// Error returned by a redaction pattern that cannot mask its input.
///
/// The obfuscator writes the field as `***` instead;
/// [`ObfuscationRule::try_apply`](crate::ObfuscationRule::try_apply) reports it
/// as a [`LogError`] with code `RedactionFailure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RedactionError(pub String);

impl RedactionError {
    /// Create a redaction error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// An ignored-route regex failed to compile
    #[error("invalid ignored route pattern `{pattern}`: {reason}")]
    InvalidRoutePattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        reason: String,
    },
    /// An ignored-route literal was empty
    #[error("ignored route literal must not be empty")]
    EmptyRoute,
    /// The request id header name was empty
    #[error("request_id_header must not be empty")]
    EmptyRequestIdHeader,
}
