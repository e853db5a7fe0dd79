//! Logging initialization
//!
//! Provides a single initialization point for the global `tracing`
//! subscriber, and the mapping from runtime mode to output rendering.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::constants::RUNTIME_MODE_ENV;
use super::sink::{ConsoleSink, JsonSink, MemorySink, Sink};
use crate::error::{LogError, LogErrorCode, LogResult};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable, colored output with debug level
    #[default]
    Development,
    /// JSON structured output with info level
    Production,
    /// Nothing rendered; tests capture records directly
    Test,
}

impl Profile {
    /// Reads the runtime mode from `APP_ENV`.
    pub fn from_env() -> Self {
        Self::from_mode(std::env::var(RUNTIME_MODE_ENV).ok().as_deref())
    }

    /// Maps a runtime mode name to a profile.
    ///
    /// `production` and `test` (case-insensitive) select their profiles;
    /// anything else, including no mode at all, is development.
    pub fn from_mode(mode: Option<&str>) -> Self {
        match mode.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("production") => Self::Production,
            Some("test") => Self::Test,
            _ => Self::Development,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    ///
    /// Every profile installs a filter, `Test` included, so `RUST_LOG`
    /// narrows test output the same way it does elsewhere.
    pub fn default_directive(&self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
            Self::Test => "trace",
        }
    }

    /// A sink rendering records directly for this profile, without going
    /// through `tracing`.
    ///
    /// `Test` captures records in a [`MemorySink`] instead of printing them.
    pub fn sink(&self) -> Box<dyn Sink> {
        match self {
            Self::Test => Box::new(MemorySink::new()),
            _ => self.writer_sink(std::io::stdout()),
        }
    }

    /// A sink rendering this profile's format into `writer`.
    ///
    /// Production writes JSON lines. Development writes colored
    /// human-readable lines; Test writes the same lines without color.
    pub fn writer_sink<W: Write + Send + 'static>(&self, writer: W) -> Box<dyn Sink> {
        match self {
            Self::Production => Box::new(JsonSink::new(writer)),
            Self::Development => Box::new(ConsoleSink::new(writer).with_ansi(true)),
            Self::Test => Box::new(ConsoleSink::new(writer)),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the global subscriber for `profile`.
///
/// Only the first call has any effect. If some other subscriber is already
/// installed it is left in place.
///
/// # Example
///
/// ```
/// use reqlog::{init, Profile};
///
/// init(Profile::Test);
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        if let Err(err) = try_init(profile) {
            tracing::debug!(error = %err, "global subscriber already installed");
        }
    });
}

/// Install the global subscriber for `profile`, failing if one is already
/// installed.
pub fn try_init(profile: Profile) -> LogResult<()> {
    let result = match profile {
        Profile::Development => tracing_subscriber::fmt()
            .with_ansi(true)
            .with_env_filter(profile.env_filter())
            .try_init(),
        Profile::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(profile.env_filter())
            .try_init(),
        Profile::Test => tracing_subscriber::registry()
            .with(profile.env_filter())
            .try_init()
            .map_err(Into::into),
    };

    result.map_err(|err| LogError::new(LogErrorCode::InitFailure, err.to_string()))
}
