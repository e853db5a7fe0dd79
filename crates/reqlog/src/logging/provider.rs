//! The logging façade used by application code.
//!
//! [`LogProvider`] owns the guarantee that no sensitive field reaches a sink
//! unredacted, and that logging never fails the caller: every error or panic
//! raised while building or writing a record is reported through an
//! unstructured fallback channel and swallowed.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::init::Profile;
use super::obfuscation::FieldObfuscator;
use super::sink::{Sink, TracingSink};
use super::types::{LogLevel, LogParams, LogRecord};
use crate::context::RequestContextStore;

/// Last-resort channel for reporting logging failures.
pub type Fallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Structured logger that obfuscates metadata and stamps the active
/// request id onto every record.
///
/// # Example
///
/// ```rust
/// use reqlog::{LogParams, LogProvider, MemorySink};
///
/// let sink = MemorySink::new();
/// let logger = LogProvider::new(sink.clone());
///
/// logger.info(
///     LogParams::new("login")
///         .with_context("AuthService")
///         .field("password", "hunter2"),
/// );
///
/// let record = sink.last().unwrap();
/// assert_eq!(record.message, "login");
/// assert_eq!(record.metadata["password"], "***");
/// ```
#[derive(Clone)]
pub struct LogProvider {
    obfuscator: Arc<FieldObfuscator>,
    sink: Arc<dyn Sink>,
    fallback: Fallback,
}

impl LogProvider {
    /// Creates a provider writing to `sink` with the default rule set.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self {
            obfuscator: Arc::new(FieldObfuscator::with_defaults()),
            sink: Arc::new(sink),
            fallback: Arc::new(write_to_stderr),
        }
    }

    /// Creates a provider rendering the way `profile` does: JSON lines in
    /// production, readable lines in development.
    pub fn from_profile(profile: Profile) -> Self {
        Self::new(profile.sink())
    }

    /// Creates a provider that re-emits records as `tracing` events.
    pub fn tracing() -> Self {
        Self::new(TracingSink)
    }

    /// Replaces the obfuscation rules.
    pub fn with_obfuscator(mut self, obfuscator: FieldObfuscator) -> Self {
        self.obfuscator = Arc::new(obfuscator);
        self
    }

    /// Replaces the fallback channel (stderr by default).
    pub fn with_fallback(mut self, fallback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    /// The obfuscator applied to every record's metadata.
    pub fn obfuscator(&self) -> &FieldObfuscator {
        &self.obfuscator
    }

    /// Logs at debug level.
    pub fn debug(&self, params: impl Into<LogParams>) {
        self.log(LogLevel::Debug, params);
    }

    /// Logs at info level.
    pub fn info(&self, params: impl Into<LogParams>) {
        self.log(LogLevel::Info, params);
    }

    /// Logs at warn level.
    pub fn warn(&self, params: impl Into<LogParams>) {
        self.log(LogLevel::Warn, params);
    }

    /// Logs at error level.
    pub fn error(&self, params: impl Into<LogParams>) {
        self.log(LogLevel::Error, params);
    }

    /// Builds a record and writes it to the sink exactly once.
    ///
    /// Never panics and never returns an error.
    pub fn log(&self, level: LogLevel, params: impl Into<LogParams>) {
        let params = params.into();
        let message = params.message.clone();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let record = self.build_record(level, params);
            self.sink.write(&record)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.report(level, &message, &err.to_string()),
            Err(payload) => self.report(level, &message, &panic_reason(payload.as_ref())),
        }
    }

    /// Builds the record a log call would write: metadata obfuscated, the
    /// active request id attached.
    pub fn build_record(&self, level: LogLevel, params: LogParams) -> LogRecord {
        let LogParams {
            message,
            context,
            fields,
        } = params;

        LogRecord::new(level, message)
            .with_context(context)
            .with_request_id(RequestContextStore::request_id())
            .with_metadata(self.obfuscator.obfuscate_map(&fields))
    }

    /// Flushes the sink, reporting failure through the fallback.
    pub fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            (self.fallback)(&format!("reqlog: failed to flush sink: {err}"));
        }
    }

    /// Only the message goes to the fallback: metadata may be unredacted if
    /// obfuscation is what failed.
    fn report(&self, level: LogLevel, message: &str, reason: &str) {
        let line = format!("reqlog: dropped {level} record \"{message}\": {reason}");
        if panic::catch_unwind(AssertUnwindSafe(|| (self.fallback)(&line))).is_err() {
            write_to_stderr(&line);
        }
    }
}

impl std::fmt::Debug for LogProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogProvider")
            .field("obfuscator", &self.obfuscator)
            .finish_non_exhaustive()
    }
}

fn write_to_stderr(line: &str) {
    let _ = writeln!(std::io::stderr(), "{line}");
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
