#![warn(missing_docs)]
//! # reqlog
//!
//! Request-correlated structured logging with sensitive field obfuscation.
//!
//! ## Overview
//!
//! - **Ambient request context** bound to the handling future, so any code
//!   running for a request can read its correlation id
//! - **Field obfuscation** of credentials and phone numbers at any nesting
//!   depth, fail-safe when a redaction pattern breaks
//! - **A logging façade** that never fails the caller
//! - **Pluggable sinks** for `tracing`, JSON lines, console text and memory
//! - **A request interceptor** emitting access logs with route ignore rules
//!
//! ## Architecture
//!
//! ```text
//!  inbound request
//!        │
//!        ▼
//! ┌──────────────────┐   opens scope   ┌──────────────────────┐
//! │ RequestLogging   │────────────────▶│ RequestContextStore  │
//! └────────┬─────────┘                 └──────────┬───────────┘
//!          │ handler code                         │ requestId
//!          ▼                                      ▼
//! ┌──────────────────┐  obfuscate   ┌──────────────────┐   LogRecord   ┌──────┐
//! │ LogProvider      │─────────────▶│ FieldObfuscator  │──────────────▶│ Sink │
//! └──────────────────┘              └──────────────────┘               └──────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use reqlog::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! init(Profile::Test);
//!
//! let sink = MemorySink::new();
//! let logger = LogProvider::new(sink.clone());
//!
//! let ctx = RequestContext::with_request_id("req-42");
//! RequestContextStore::run(ctx, async {
//!     logger.info(
//!         LogParams::new("user created")
//!             .with_context("UserService")
//!             .field("userId", 42)
//!             .field("password", "hunter2"),
//!     );
//! })
//! .await;
//!
//! let record = sink.last().unwrap();
//! assert_eq!(record.request_id.as_deref(), Some("req-42"));
//! assert_eq!(record.metadata["password"], "***");
//! # });
//! ```

pub mod config;
pub mod context;
mod error;
pub mod logging;
pub mod middleware;

#[cfg(test)]
mod tests;

// Public API
pub use config::{LoggingConfig, LoggingIgnoreConfig, RoutePattern};
pub use context::{RequestContext, RequestContextStore};
pub use error::{ConfigValidationError, LogError, LogErrorCode, LogResult, RedactionError};
pub use logging::{
    ConsoleSink, FanoutSink, FieldObfuscator, JsonSink, LogLevel, LogParams, LogProvider,
    LogRecord, MemorySink, ObfuscationRule, PatternInput, Profile, RequestId, Sink, TracingSink,
    default_rules, init, mask_middle, obfuscate, render_line, try_init,
};
pub use middleware::{RequestInfo, RequestLogging, should_log_slow_request};

/// Prelude module for convenient imports.
///
/// ```rust
/// use reqlog::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        FieldObfuscator, LogLevel, LogParams, LogProvider, LoggingConfig, LoggingIgnoreConfig,
        MemorySink, ObfuscationRule, Profile, RequestContext, RequestContextStore, RequestInfo,
        RequestLogging, Sink, TracingSink, init,
    };
}
