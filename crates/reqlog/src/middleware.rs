//! Request-logging interceptor.
//!
//! [`RequestLogging`] wraps the handler future of one inbound request. It
//! opens a [`RequestContextStore`] scope carrying the request's correlation
//! id, so every log call made while handling the request is tagged with it,
//! and emits the access log pair ("request started" / "request completed")
//! unless the route is ignored.
//!
//! The interceptor is framework-agnostic: an HTTP server adapter only has to
//! build a [`RequestInfo`] and hand over the handler future.
//!
//! # Example
//! ```rust
//! use reqlog::{LogProvider, LoggingConfig, MemorySink, RequestContextStore, RequestInfo, RequestLogging};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let sink = MemorySink::new();
//! let logging = RequestLogging::new(LogProvider::new(sink.clone()), LoggingConfig::new());
//!
//! let req = RequestInfo::new("GET", "/users/7").with_header("X-Request-Id", "abc-123");
//! let result: Result<_, String> = logging
//!     .handle(req, async { Ok(RequestContextStore::request_id()) })
//!     .await;
//!
//! assert_eq!(result.unwrap().as_deref(), Some("abc-123"));
//! assert_eq!(sink.len(), 2);
//! # });
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LoggingConfig;
use crate::context::{RequestContext, RequestContextStore};
use crate::logging::{LogParams, LogProvider, REQUEST_LOG_CONTEXT, RequestId};

// =============================================================================
// RequestInfo
// =============================================================================

/// The parts of an inbound request the interceptor looks at.
///
/// Header names are stored lowercased, so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Request method (e.g. `GET`)
    pub method: String,
    /// Request path, without query string
    pub path: String,
    /// Headers keyed by lowercase name
    pub headers: HashMap<String, String>,
}

impl RequestInfo {
    /// Create a request with no headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// =============================================================================
// RequestLogging
// =============================================================================

/// Wraps request handlers with a correlation scope and access logging.
///
/// Cheap to clone; share one instance across all requests.
#[derive(Debug, Clone)]
pub struct RequestLogging {
    provider: Arc<LogProvider>,
    config: Arc<LoggingConfig>,
}

impl RequestLogging {
    /// Create an interceptor logging through `provider`.
    pub fn new(provider: LogProvider, config: LoggingConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
        }
    }

    /// Create an interceptor whose provider renders for `config.profile`.
    pub fn from_config(config: LoggingConfig) -> Self {
        Self::new(LogProvider::from_profile(config.profile), config)
    }

    /// The provider access log records are written through.
    pub fn provider(&self) -> &LogProvider {
        &self.provider
    }

    /// The active configuration.
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// The correlation id for `req`: the header-supplied value when present
    /// and non-blank, otherwise a fresh one.
    pub fn resolve_request_id(&self, req: &RequestInfo) -> RequestId {
        req.header(&self.config.request_id_header)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RequestId::from)
            .unwrap_or_default()
    }

    /// Runs `handler` inside a fresh request context and logs around it.
    ///
    /// The handler's result is returned unchanged; logging never alters or
    /// fails it.
    pub async fn handle<F, T, E>(&self, req: RequestInfo, handler: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let request_id = self.resolve_request_id(&req);
        let ctx = RequestContext::with_request_id(request_id)
            .with("method", req.method.as_str())
            .with("path", req.path.as_str());

        RequestContextStore::run(ctx, async move {
            // Early return if access logging is off for this route
            if !self.config.ignore.should_log(&req.path) {
                return handler.await;
            }

            self.provider.info(self.access_params("request started", &req));

            let start = Instant::now();
            let result = handler.await;
            let duration = start.elapsed();
            let duration_ms = duration_millis(&duration);

            match &result {
                Ok(_) => self.provider.info(
                    self.access_params("request completed", &req)
                        .field("duration_ms", duration_ms),
                ),
                Err(error) => self.provider.warn(
                    self.access_params("request failed", &req)
                        .field("duration_ms", duration_ms)
                        .field("error", error.to_string()),
                ),
            }

            if should_log_slow_request(&self.config, &duration) {
                self.provider.warn(
                    self.access_params("slow request", &req)
                        .field("duration_ms", duration_ms)
                        .field(
                            "threshold_ms",
                            self.config
                                .slow_request_threshold_ms
                                .map_or(Value::Null, Value::from),
                        ),
                );
            }

            result
        })
        .await
    }

    fn access_params(&self, message: &str, req: &RequestInfo) -> LogParams {
        LogParams::new(message)
            .with_context(REQUEST_LOG_CONTEXT)
            .field("method", &req.method)
            .field("path", &req.path)
    }
}

/// Helper function to determine if a request should be logged as slow.
pub fn should_log_slow_request(config: &LoggingConfig, duration: &Duration) -> bool {
    config
        .slow_request_threshold_ms
        .map(|threshold| duration_millis(duration) > threshold)
        .unwrap_or(false)
}

fn duration_millis(duration: &Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
