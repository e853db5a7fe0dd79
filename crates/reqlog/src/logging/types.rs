//! Core types for the logging module.
//!
//! - RequestId: opaque correlation id for one inbound request
//! - LogLevel: the four levels a record can carry
//! - LogParams: what application code hands to the provider
//! - LogRecord: the normalized record a sink receives

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::constants::SHORT_ID_LENGTH;

/// Unique identifier for a request, used for tracing and correlation.
///
/// Caller-supplied correlation ids are kept verbatim, so the inner value is an
/// opaque string rather than a parsed UUID. Generated ids are UUID v7, which
/// sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)).to_string())
    }

    /// Creates a request ID from an existing string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the request ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the short form of the request ID (first N characters).
    pub fn short(&self) -> String {
        self.0.chars().take(SHORT_ID_LENGTH).collect()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Severity of a log record.
///
/// Ordered from most verbose (`Debug`) to most severe (`Error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail for development.
    Debug,
    /// Routine operational messages.
    Info,
    /// Something unexpected that the caller recovered from.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Lowercase name, as used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts this log level to a tracing::Level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a single log call: `{message, context?, ...fields}`.
///
/// Build one with the builder methods, or convert a JSON object, in which
/// case `message` and `context` are split out and every other key becomes a
/// metadata field.
///
/// # Example
///
/// ```rust
/// use reqlog::LogParams;
/// use serde_json::json;
///
/// let typed = LogParams::new("user created")
///     .with_context("UserService")
///     .field("userId", 42);
///
/// let from_json = LogParams::from(json!({
///     "message": "user created",
///     "context": "UserService",
///     "userId": 42,
/// }));
///
/// assert_eq!(typed, from_json);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogParams {
    /// The log message.
    pub message: String,
    /// Name of the subsystem emitting the record.
    pub context: Option<String>,
    /// Arbitrary structured fields; obfuscated before reaching a sink.
    pub fields: Map<String, Value>,
}

impl LogParams {
    /// Creates parameters with the given message and no fields.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            fields: Map::new(),
        }
    }

    /// Sets the subsystem name.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Adds a metadata field.
    ///
    /// A value that fails to serialize is recorded as a placeholder string
    /// rather than dropped, so the field name still shows up.
    pub fn field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String("[serialization error]".to_string()));
        self.fields.insert(key.into(), value);
        self
    }

    /// Adds every entry of a JSON object as a metadata field.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }
}

impl From<&str> for LogParams {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for LogParams {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<Value> for LogParams {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let message = fields
                    .remove("message")
                    .map(text_of)
                    .unwrap_or_default();
                let context = match fields.remove("context") {
                    None | Some(Value::Null) => None,
                    Some(other) => Some(text_of(other)),
                };
                Self {
                    message,
                    context,
                    fields,
                }
            }
            other => Self::new(text_of(other)),
        }
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The normalized record forwarded to a sink.
///
/// Serializes with camelCase keys (`requestId`), and omits `context` and
/// `requestId` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// The log message, never obfuscated.
    pub message: String,
    /// Subsystem name, never obfuscated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Correlation id of the request the record was emitted under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Obfuscated metadata fields.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Unix timestamp in milliseconds when the record was built.
    pub timestamp: u64,
}

impl LogRecord {
    /// Creates a record stamped with the current time and no metadata.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: None,
            request_id: None,
            metadata: Map::new(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }

    /// Sets the subsystem name.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Sets the correlation id.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the metadata fields.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}
