//! Structured logging with sensitive field obfuscation
//!
//! Turns `{message, context?, ...fields}` log calls into [`LogRecord`]s whose
//! metadata has been scrubbed of credentials, tagged with the correlation id
//! of the request they were emitted under, and handed to a pluggable [`Sink`].
//!
//! # Architecture
//!
//! The logging module is organized into focused submodules:
//!
//! - **types**: Core types (RequestId, LogLevel, LogParams, LogRecord)
//! - **constants**: Sensitive field names, replacement strings and limits
//! - **obfuscation**: Rule-driven recursive redaction with change tracking
//! - **sink**: The Sink trait and its tracing, JSON, console and memory implementations
//! - **provider**: The LogProvider façade application code logs through
//! - **init**: Global subscriber installation per runtime profile
//!
//! # Basic Usage
//!
//! ```rust
//! use reqlog::logging::{LogParams, LogProvider, MemorySink};
//!
//! let sink = MemorySink::new();
//! let logger = LogProvider::new(sink.clone());
//!
//! logger.warn(
//!     LogParams::new("password reset")
//!         .with_context("AuthService")
//!         .field("phoneNumber", "1234567890")
//!         .field("newPassword", "s3cret"),
//! );
//!
//! let record = sink.last().unwrap();
//! assert_eq!(record.metadata["phoneNumber"], "123*****90");
//! assert_eq!(record.metadata["newPassword"], "***");
//! ```
//!
//! ## Custom Rules
//!
//! ```rust
//! use reqlog::logging::{FieldObfuscator, ObfuscationRule};
//! use serde_json::json;
//!
//! let obfuscator = FieldObfuscator::with_defaults()
//!     .with_rule(ObfuscationRule::mask("cardNumber", 0, 4))
//!     .with_rule(ObfuscationRule::constant("ssn", "[hidden]"));
//!
//! let out = obfuscator.obfuscate(&json!({"cardNumber": "4111111111111111", "ssn": "x"}));
//! assert_eq!(out, json!({"cardNumber": "************1111", "ssn": "[hidden]"}));
//! ```

// =============================================================================
// Submodules
// =============================================================================

pub(crate) mod constants;
mod init;
mod obfuscation;
mod provider;
mod sink;
pub(crate) mod types;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Constants
pub use constants::{
    DEFAULT_REQUEST_ID_HEADER, DEFAULT_SENSITIVE_FIELDS, DEFAULT_SLOW_THRESHOLD_MS,
    MAX_OBFUSCATION_DEPTH, PHONE_NUMBER_FIELD, REDACTED, REQUEST_ID_KEY, REQUEST_LOG_CONTEXT,
    RUNTIME_MODE_ENV, SHORT_ID_LENGTH,
};

// Core Types
pub use types::{LogLevel, LogParams, LogRecord, RequestId};

// Obfuscation
pub use obfuscation::{
    FieldObfuscator, ObfuscationRule, PatternInput, RedactFn, default_rules, mask_middle,
    obfuscate,
};

// Sinks
pub use sink::{ConsoleSink, FanoutSink, JsonSink, MemorySink, Sink, TracingSink, render_line};

// Provider
pub use provider::{Fallback, LogProvider};

// Initialization
pub use init::{Profile, init, try_init};
