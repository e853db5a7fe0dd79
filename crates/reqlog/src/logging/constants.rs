//! Constants and default values for the logging module.
//!
//! This module centralizes the field names, replacement strings and limits
//! shared by the obfuscator, the provider and the request interceptor.

/// Replacement written for fully redacted fields, and for any field whose
/// redaction pattern fails.
pub const REDACTED: &str = "***";

/// Field names whose values are always replaced by [`REDACTED`].
///
/// Matching is exact and case-insensitive.
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "oldPassword",
    "newPassword",
    "accessToken",
    "refreshToken",
    "authorization",
    "authToken",
    "secret",
];

/// Field name whose value is partially masked rather than fully redacted.
pub const PHONE_NUMBER_FIELD: &str = "phoneNumber";

/// Number of leading characters a masked phone number keeps.
pub const PHONE_VISIBLE_PREFIX: usize = 3;

/// Number of trailing characters a masked phone number keeps.
pub const PHONE_VISIBLE_SUFFIX: usize = 2;

/// Deepest nesting level the obfuscator descends into.
///
/// Matches serde_json's own parser recursion limit, so any value produced by
/// parsing JSON text is traversed completely. Deeper arrays and objects are
/// replaced by [`REDACTED`] whole.
pub const MAX_OBFUSCATION_DEPTH: usize = 128;

/// Context store key holding the request correlation id.
pub const REQUEST_ID_KEY: &str = "requestId";

/// Default header carrying a caller-supplied correlation id.
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Length of the short request ID format (first N characters).
pub const SHORT_ID_LENGTH: usize = 8;

/// Default threshold for slow request logging in milliseconds.
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 1000;

/// Environment variable selecting the runtime mode.
pub const RUNTIME_MODE_ENV: &str = "APP_ENV";

/// Subsystem name attached to the records the request interceptor emits.
pub const REQUEST_LOG_CONTEXT: &str = "RequestLogging";
