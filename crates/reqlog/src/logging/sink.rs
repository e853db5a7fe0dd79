use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::LogResult;
use crate::logging::types::{LogLevel, LogRecord};

// =============================================================================
// Sink Trait
// =============================================================================

/// A transport that accepts finished log records.
///
/// The provider calls [`Sink::write`] exactly once per log call, with metadata
/// already obfuscated. Rendering (text, JSON, tracing events) is entirely the
/// sink's business. Errors are reported by the provider's fallback channel and
/// never reach application code.
pub trait Sink: Send + Sync {
    /// Writes one record.
    fn write(&self, record: &LogRecord) -> LogResult<()>;

    /// Flushes buffered output, if the sink buffers.
    fn flush(&self) -> LogResult<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        (**self).write(record)
    }

    fn flush(&self) -> LogResult<()> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        (**self).write(record)
    }

    fn flush(&self) -> LogResult<()> {
        (**self).flush()
    }
}

/// Locks a sink's state, taking it back even if a previous writer panicked.
///
/// A panic mid-write can at worst leave a partial line behind, and the next
/// record must still get out.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// TracingSink
// =============================================================================

/// Sink that re-emits records as `tracing` events.
///
/// The installed subscriber decides the rendering; see
/// [`init`](crate::init) for the JSON and human-readable
/// profiles. Metadata travels as a single JSON-encoded field so nested values
/// survive either rendering.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        let request_id = record.request_id.as_deref().unwrap_or_default();
        let context = record.context.as_deref().unwrap_or_default();
        let metadata = serde_json::to_string(&record.metadata)?;
        let message = record.message.as_str();

        match record.level {
            LogLevel::Debug => {
                tracing::debug!(
                    target: "reqlog",
                    request_id = %request_id,
                    context = %context,
                    metadata = %metadata,
                    "{}",
                    message
                );
            }
            LogLevel::Info => {
                tracing::info!(
                    target: "reqlog",
                    request_id = %request_id,
                    context = %context,
                    metadata = %metadata,
                    "{}",
                    message
                );
            }
            LogLevel::Warn => {
                tracing::warn!(
                    target: "reqlog",
                    request_id = %request_id,
                    context = %context,
                    metadata = %metadata,
                    "{}",
                    message
                );
            }
            LogLevel::Error => {
                tracing::error!(
                    target: "reqlog",
                    request_id = %request_id,
                    context = %context,
                    metadata = %metadata,
                    "{}",
                    message
                );
            }
        }

        Ok(())
    }
}

// =============================================================================
// JsonSink
// =============================================================================

/// Sink that writes one JSON object per line.
///
/// Suited to log aggregation systems; the line is the serialized
/// [`LogRecord`] with camelCase keys.
pub struct JsonSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonSink<std::io::Stdout> {
    /// JSON lines on standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonSink<W> {
    /// JSON lines into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for JsonSink<W> {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut writer = lock(&self.writer);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> LogResult<()> {
        let mut writer = lock(&self.writer);
        writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// ConsoleSink
// =============================================================================

/// Sink that writes human-readable lines, optionally colored by level.
///
/// ```text
/// INFO  [UserService] (0190c6b2-...) user created userId=42 phoneNumber="123*****90"
/// ```
pub struct ConsoleSink<W: Write + Send> {
    writer: Mutex<W>,
    ansi: bool,
}

impl ConsoleSink<std::io::Stdout> {
    /// Colored lines on standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout()).with_ansi(true)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Plain lines into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            ansi: false,
        }
    }

    /// Enables or disables ANSI level colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        let mut line = render_line(record, self.ansi);
        line.push('\n');

        let mut writer = lock(&self.writer);
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> LogResult<()> {
        let mut writer = lock(&self.writer);
        writer.flush()?;
        Ok(())
    }
}

/// Renders a record as a single human-readable line (no trailing newline).
///
/// Metadata values are written as compact JSON, so strings keep their quotes
/// and nested objects stay unambiguous.
pub fn render_line(record: &LogRecord, ansi: bool) -> String {
    let level = record.level.as_str().to_uppercase();
    let mut line = String::new();

    if ansi {
        let _ = write!(line, "{}{:<5}\x1b[0m", level_color(record.level), level);
    } else {
        let _ = write!(line, "{:<5}", level);
    }

    if let Some(context) = &record.context {
        let _ = write!(line, " [{}]", context);
    }
    if let Some(request_id) = &record.request_id {
        let _ = write!(line, " ({})", request_id);
    }
    let _ = write!(line, " {}", record.message);

    for (key, value) in &record.metadata {
        let _ = write!(line, " {}={}", key, value);
    }

    line
}

fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "\x1b[34m",
        LogLevel::Info => "\x1b[32m",
        LogLevel::Warn => "\x1b[33m",
        LogLevel::Error => "\x1b[31m",
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// Sink that keeps every record in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the provider
/// and assert on the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Creates an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.records).clone()
    }

    /// Returns the most recent record.
    pub fn last(&self) -> Option<LogRecord> {
        lock(&self.records).last().cloned()
    }

    /// Returns the captured records with the given message.
    pub fn with_message(&self, message: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.message == message)
            .collect()
    }

    /// Clears all captured records.
    pub fn clear(&self) {
        lock(&self.records).clear();
    }

    /// Returns the number of captured records.
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    /// Returns true if no records have been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

// =============================================================================
// FanoutSink
// =============================================================================

/// Sink that forwards each record to several sinks.
///
/// Every sink is attempted even if an earlier one fails; the first failure is
/// returned.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanoutSink {
    /// Creates a fanout with no targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target sink.
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Number of target sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the fanout has no targets.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for FanoutSink {
    fn write(&self, record: &LogRecord) -> LogResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.write(record) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&self) -> LogResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.flush() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
