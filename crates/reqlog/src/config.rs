//! Configuration for request logging.
//!
//! [`LoggingConfig`] gathers everything the request interceptor needs: the
//! output profile, which routes are excluded from access logging, the slow
//! request threshold and the header carrying caller-supplied correlation ids.
//! It deserializes from any serde format; ignored routes accept either a
//! literal path or a regex pattern.
//!
//! # Example
//! ```rust
//! use reqlog::{LoggingConfig, LoggingIgnoreConfig, Profile, RoutePattern};
//!
//! let config = LoggingConfig::new()
//!     .with_profile(Profile::Production)
//!     .with_slow_request_threshold(500)
//!     .with_ignore(
//!         LoggingIgnoreConfig::new()
//!             .ignore_route("/health")
//!             .ignore_pattern("^/metrics(/.*)?$")
//!             .unwrap(),
//!     );
//!
//! config.validate().unwrap();
//! assert!(!config.ignore.should_log("/health"));
//! assert!(!config.ignore.should_log("/metrics/cpu"));
//! assert!(config.ignore.should_log("/users"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigValidationError;
use crate::logging::{DEFAULT_REQUEST_ID_HEADER, DEFAULT_SLOW_THRESHOLD_MS, Profile};

// =============================================================================
// RoutePattern
// =============================================================================

/// One entry of the ignored-routes list.
///
/// Deserializes from a plain string (an exact path) or from
/// `{ "pattern": "<regex>" }`. Regex patterns are compiled when the value is
/// built, so an invalid pattern is rejected at load time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRoutePattern", into = "RawRoutePattern")]
pub enum RoutePattern {
    /// Matches a path exactly.
    Literal(String),
    /// Matches any path the regex finds a match in.
    Pattern(Regex),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRoutePattern {
    Literal(String),
    Pattern { pattern: String },
}

impl RoutePattern {
    /// An exact path.
    pub fn literal(path: impl Into<String>) -> Self {
        Self::Literal(path.into())
    }

    /// A regex pattern.
    ///
    /// Matching is unanchored; use `^` and `$` to match whole paths.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigValidationError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|err| ConfigValidationError::InvalidRoutePattern {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })
    }

    /// Whether `path` is covered by this entry.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == path,
            Self::Pattern(regex) => regex.is_match(path),
        }
    }

    /// The literal path or regex source.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(literal) => literal,
            Self::Pattern(regex) => regex.as_str(),
        }
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        match self {
            Self::Literal(literal) if literal.is_empty() => Err(ConfigValidationError::EmptyRoute),
            _ => Ok(()),
        }
    }
}

impl TryFrom<RawRoutePattern> for RoutePattern {
    type Error = ConfigValidationError;

    fn try_from(raw: RawRoutePattern) -> Result<Self, Self::Error> {
        match raw {
            RawRoutePattern::Literal(path) => Ok(Self::Literal(path)),
            RawRoutePattern::Pattern { pattern } => Self::pattern(&pattern),
        }
    }
}

impl From<RoutePattern> for RawRoutePattern {
    fn from(route: RoutePattern) -> Self {
        match route {
            RoutePattern::Literal(path) => Self::Literal(path),
            RoutePattern::Pattern(regex) => Self::Pattern {
                pattern: regex.as_str().to_string(),
            },
        }
    }
}

impl From<&str> for RoutePattern {
    fn from(path: &str) -> Self {
        Self::literal(path)
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => f.debug_tuple("Literal").field(path).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
        }
    }
}

// =============================================================================
// LoggingIgnoreConfig
// =============================================================================

/// Decides whether a route's traffic is access-logged at all.
///
/// With `enabled = false` no request is access-logged. Otherwise every
/// request is, except those whose path matches an ignored route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingIgnoreConfig {
    /// Whether request access logging is on.
    pub enabled: bool,
    /// Paths excluded from access logging.
    pub ignored_routes: Vec<RoutePattern>,
}

impl Default for LoggingIgnoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignored_routes: Vec::new(),
        }
    }
}

impl LoggingIgnoreConfig {
    /// Access logging on, nothing ignored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access logging off for every route.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set whether access logging is on.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Ignore an exact path.
    pub fn ignore_route(mut self, path: impl Into<String>) -> Self {
        self.ignored_routes.push(RoutePattern::literal(path));
        self
    }

    /// Ignore every path matching a regex.
    pub fn ignore_pattern(mut self, pattern: &str) -> Result<Self, ConfigValidationError> {
        self.ignored_routes.push(RoutePattern::pattern(pattern)?);
        Ok(self)
    }

    /// Whether requests to `path` are access-logged.
    pub fn should_log(&self, path: &str) -> bool {
        self.enabled && !self.is_ignored(path)
    }

    /// Whether `path` matches an ignored route, regardless of `enabled`.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_routes.iter().any(|route| route.matches(path))
    }

    /// Validate the ignored routes.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.ignored_routes.iter().try_for_each(RoutePattern::validate)
    }
}

// =============================================================================
// LoggingConfig
// =============================================================================

/// Configuration for the request-logging pipeline.
///
/// # Fields
///
/// * `profile` - Output rendering. Default: `Development`.
/// * `ignore` - Access logging switch and ignored routes.
/// * `slow_request_threshold_ms` - Requests slower than this get an extra
///   `warn` record; `None` disables the check. Default: 1000.
/// * `request_id_header` - Header carrying a caller-supplied correlation id.
///   Default: `x-request-id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Output profile
    pub profile: Profile,
    /// Route ignore policy
    pub ignore: LoggingIgnoreConfig,
    /// Slow request threshold in milliseconds
    pub slow_request_threshold_ms: Option<u64>,
    /// Correlation id header name (matched case-insensitively)
    pub request_id_header: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            ignore: LoggingIgnoreConfig::default(),
            slow_request_threshold_ms: Some(DEFAULT_SLOW_THRESHOLD_MS),
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the profile taken from `APP_ENV`.
    pub fn from_env() -> Self {
        Self::default().with_profile(Profile::from_env())
    }

    /// Set the output profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the route ignore policy.
    pub fn with_ignore(mut self, ignore: LoggingIgnoreConfig) -> Self {
        self.ignore = ignore;
        self
    }

    /// Set the slow request threshold in milliseconds.
    pub fn with_slow_request_threshold(mut self, threshold_ms: u64) -> Self {
        self.slow_request_threshold_ms = Some(threshold_ms);
        self
    }

    /// Disable slow request detection.
    pub fn without_slow_request_threshold(mut self) -> Self {
        self.slow_request_threshold_ms = None;
        self
    }

    /// Set the correlation id header name.
    pub fn with_request_id_header(mut self, header: impl Into<String>) -> Self {
        self.request_id_header = header.into();
        self
    }

    /// Validate the configuration and return the first problem found.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `request_id_header` is empty
    /// - an ignored route literal is empty
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.request_id_header.trim().is_empty() {
            return Err(ConfigValidationError::EmptyRequestIdHeader);
        }
        self.ignore.validate()
    }
}
