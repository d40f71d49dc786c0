//! Main logger implementation

use super::{
    error::{LoggerError, Result},
    exclude::Exclude,
    intercept::{InterceptLogger, SinkAdapter},
    log_level::{AtomicLevel, LogLevel},
    metrics::LoggerMetrics,
    multisink::MultiSinkLogger,
    output_format::{Formatter, FormatterConfig, OutputFormat},
    record::{CallSite, Record},
    timestamp::TimestampFormat,
    value::{Value, MISSING_KEY},
    writer::{ColorOption, Flushable, LogWriter, Output, OutputOptions},
};
use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::Arc;

/// Write failures are reported on stderr once per this many failures.
const FAILURE_REPORT_INTERVAL: u64 = 1000;

/// State shared by a logger and every logger derived from it.
struct Shared {
    writer: Mutex<LogWriter>,
    formatter: Formatter,
    exclude: Option<Box<dyn Exclude>>,
    metrics: LoggerMetrics,
}

/// Leveled, structured logger.
///
/// Cloning is cheap and yields a handle to the same logger. [`with`],
/// [`named`] and [`reset_named`] build new loggers that share the output,
/// the formatter and (unless independent levels were requested) the level.
///
/// [`with`]: Logger::with
/// [`named`]: Logger::named
/// [`reset_named`]: Logger::reset_named
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let buffer = SharedBuffer::default();
/// let logger = Logger::builder()
///     .name("test")
///     .output(buffer.clone())
///     .disable_time(true)
///     .build();
///
/// logger.info("this is test", &["who".into(), "programmer".into()]);
/// assert_eq!(buffer.contents(), "[INFO]  test: this is test: who=programmer\n");
/// ```
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    implied: Arc<[Value]>,
    level: Arc<AtomicLevel>,
    independent_levels: bool,
    shared: Arc<Shared>,
}

impl Logger {
    /// Logger at the default level writing text to stderr
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    /// Logger that never writes anything
    #[must_use]
    pub fn null() -> Self {
        LoggerBuilder::new()
            .level(LogLevel::Off)
            .output_target(Output::sink())
            .build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_structured_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("app")
    ///     .level(LogLevel::Debug)
    ///     .json_format(true)
    ///     .output_target(Output::stdout())
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build a derived logger from this one's shared parts.
    fn derive(&self, name: Arc<str>, implied: Arc<[Value]>) -> Logger {
        let level = if self.independent_levels {
            Arc::new(AtomicLevel::new(self.level.load()))
        } else {
            Arc::clone(&self.level)
        };

        Logger {
            name,
            implied,
            level,
            independent_levels: self.independent_levels,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Filter, format and write one call.
    pub(crate) fn emit(
        &self,
        name: &str,
        level: LogLevel,
        msg: &str,
        args: &[Value],
        location: Option<&'static Location<'static>>,
    ) {
        if !self.enabled(level) {
            return;
        }

        if let Some(exclude) = &self.shared.exclude {
            if exclude.exclude(level, msg, args) {
                self.shared.metrics.record_excluded();
                return;
            }
        }

        let record = Record::new(level, msg, self.shared.formatter.now())
            .with_location(location.map(CallSite::from))
            .with_args(&self.implied, args);
        let line = self.shared.formatter.format(name, &record);

        let result = {
            let mut writer = self.shared.writer.lock();
            writer.write(&line);
            writer.flush(level)
        };

        match result {
            Ok(()) => {
                self.shared.metrics.record_written();
            }
            Err(e) => self.report_write_failure(&e),
        }
    }

    fn report_write_failure(&self, err: &io::Error) {
        let failures = self.shared.metrics.record_write_failure();
        if failures % FAILURE_REPORT_INTERVAL == 0 {
            eprintln!(
                "[LOGGER ERROR] Failed to write log line ({} failures so far): {}",
                failures + 1,
                err
            );
        }
    }

    /// Emit `msg` and `args` at `level`
    #[track_caller]
    pub fn log(&self, level: LogLevel, msg: &str, args: &[Value]) {
        self.emit(&self.name, level, msg, args, Some(Location::caller()));
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, msg: &str, args: &[Value]) {
        self.emit(&self.name, LogLevel::Trace, msg, args, Some(Location::caller()));
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, msg: &str, args: &[Value]) {
        self.emit(&self.name, LogLevel::Debug, msg, args, Some(Location::caller()));
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, msg: &str, args: &[Value]) {
        self.emit(&self.name, LogLevel::Info, msg, args, Some(Location::caller()));
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, msg: &str, args: &[Value]) {
        self.emit(&self.name, LogLevel::Warn, msg, args, Some(Location::caller()));
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, msg: &str, args: &[Value]) {
        self.emit(&self.name, LogLevel::Error, msg, args, Some(Location::caller()));
    }

    /// Whether a call at `level` would be written
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level.load().enables(level)
    }

    pub fn is_trace(&self) -> bool {
        self.level.load() <= LogLevel::Trace
    }

    pub fn is_debug(&self) -> bool {
        self.level.load() <= LogLevel::Debug
    }

    pub fn is_info(&self) -> bool {
        self.level.load() <= LogLevel::Info
    }

    pub fn is_warn(&self) -> bool {
        self.level.load() <= LogLevel::Warn
    }

    pub fn is_error(&self) -> bool {
        self.level.load() <= LogLevel::Error
    }

    /// Current threshold
    pub fn level(&self) -> LogLevel {
        self.level.load()
    }

    /// Change the threshold of this logger and every logger sharing its
    /// level cell.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level);
    }

    /// Logger whose implied arguments are this logger's merged with `args`.
    ///
    /// Keys are deduplicated (the last value wins) and sorted. An odd
    /// trailing value is kept under [`MISSING_KEY`].
    pub fn with(&self, args: &[Value]) -> Logger {
        self.derive(Arc::clone(&self.name), merge_implied(&self.implied, args))
    }

    /// Logger whose name is this one's with `.name` appended
    pub fn named(&self, name: &str) -> Logger {
        let name: Arc<str> = if self.name.is_empty() {
            Arc::from(name)
        } else {
            Arc::from(format!("{}.{}", self.name, name))
        };
        self.derive(name, Arc::clone(&self.implied))
    }

    /// Logger named exactly `name`
    pub fn reset_named(&self, name: &str) -> Logger {
        self.derive(Arc::from(name), Arc::clone(&self.implied))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implied_args(&self) -> &[Value] {
        &self.implied
    }

    /// Whether derived loggers get their own level cell
    pub fn has_independent_levels(&self) -> bool {
        self.independent_levels
    }

    /// Output format of the lines this logger writes
    pub fn output_format(&self) -> OutputFormat {
        self.shared.formatter.output_format()
    }

    /// Get the logger metrics, shared with every derived logger
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Replace the output for this logger and every logger sharing it.
    ///
    /// Fails if `opts` carries no output.
    pub fn reset_output(&self, opts: OutputOptions) -> Result<()> {
        let output = opts
            .output
            .ok_or_else(|| LoggerError::config("output", "given output is nil"))?;

        let _previous = self.shared.writer.lock().replace_output(output, opts.color);
        Ok(())
    }

    /// Flush `flushable`, then replace the output.
    ///
    /// The output is left untouched if flushing fails.
    pub fn reset_output_with_flush(
        &self,
        opts: OutputOptions,
        flushable: &dyn Flushable,
    ) -> Result<()> {
        let output = opts
            .output
            .ok_or_else(|| LoggerError::config("output", "given output is nil"))?;

        let mut writer = self.shared.writer.lock();
        flushable
            .flush()
            .map_err(|e| LoggerError::flush("flushing previous output", e))?;
        let _previous = writer.replace_output(output, opts.color);
        Ok(())
    }
}

/// Merge `args` into `implied`, deduplicating and sorting by key.
pub(crate) fn merge_implied(implied: &[Value], args: &[Value]) -> Arc<[Value]> {
    let (pairs, extra) = match args.split_last() {
        Some((extra, pairs)) if args.len() % 2 != 0 => (pairs, Some(extra)),
        _ => (args, None),
    };

    let mut merged: BTreeMap<String, Value> = BTreeMap::new();
    for pair in implied.chunks_exact(2).chain(pairs.chunks_exact(2)) {
        merged.insert(pair[0].key_text(), pair[1].clone());
    }

    let mut out = Vec::with_capacity(merged.len() * 2 + 2);
    for (key, value) in merged {
        out.push(Value::String(key));
        out.push(value);
    }

    if let Some(extra) = extra {
        out.push(Value::from(MISSING_KEY));
        out.push(extra.clone());
    }

    out.into()
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level.load())
            .field("implied", &self.implied)
            .field("independent_levels", &self.independent_levels)
            .finish_non_exhaustive()
    }
}

impl SinkAdapter for Logger {
    fn accept(&self, name: &str, level: LogLevel, msg: &str, args: &[Value]) {
        self.emit(name, level, msg, args, None);
    }

    fn accept_at(
        &self,
        name: &str,
        level: LogLevel,
        msg: &str,
        args: &[Value],
        location: Option<&'static Location<'static>>,
    ) {
        self.emit(name, level, msg, args, location);
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .name("api")
///     .level(LogLevel::Debug)
///     .include_location(true)
///     .color(ColorOption::Auto)
///     .exclude(ExcludeByPrefix::new("healthcheck"))
///     .build();
/// ```
pub struct LoggerBuilder {
    pub(crate) name: String,
    pub(crate) level: LogLevel,
    pub(crate) output: Option<Output>,
    pub(crate) color: ColorOption,
    pub(crate) formatter: FormatterConfig,
    pub(crate) independent_levels: bool,
    pub(crate) exclude: Option<Box<dyn Exclude>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: String::new(),
            level: LogLevel::NoLevel,
            output: None,
            color: ColorOption::Off,
            formatter: FormatterConfig::default(),
            independent_levels: false,
            exclude: None,
        }
    }

    /// Name prefix for every line
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Minimum level; `NoLevel` means the default (Info)
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Write to `writer` (stderr if never set)
    #[must_use = "builder methods return a new value"]
    pub fn output<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Some(Output::new(writer));
        self
    }

    /// Write to a prepared [`Output`], e.g. stdout or a leveled writer
    #[must_use = "builder methods return a new value"]
    pub fn output_target(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn json_format(mut self, json: bool) -> Self {
        self.formatter.output_format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        self
    }

    /// Record the file and line of each logging call
    #[must_use = "builder methods return a new value"]
    pub fn include_location(mut self, include: bool) -> Self {
        self.formatter.include_location = include;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_format(mut self, format: TimestampFormat) -> Self {
        self.formatter.timestamp_format = format;
        self
    }

    /// Use a strftime pattern for timestamps; empty selects the default
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_structured_logger::Logger;
    ///
    /// let logger = Logger::builder().custom_time_format("%-I:%M%p").build();
    /// ```
    #[must_use = "builder methods return a new value"]
    pub fn custom_time_format(mut self, pattern: &str) -> Self {
        self.formatter.timestamp_format = TimestampFormat::from_pattern(pattern);
        self
    }

    /// Clock used to timestamp records
    #[must_use = "builder methods return a new value"]
    pub fn time_fn<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<FixedOffset> + Send + Sync + 'static,
    {
        self.formatter.time_fn = Arc::new(clock);
        self
    }

    /// Leave the timestamp out of every line
    #[must_use = "builder methods return a new value"]
    pub fn disable_time(mut self, disable: bool) -> Self {
        self.formatter.disable_time = disable;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn color(mut self, color: ColorOption) -> Self {
        self.color = color;
        self
    }

    /// Give each derived logger its own level cell, so `set_level` on
    /// one does not affect the others
    #[must_use = "builder methods return a new value"]
    pub fn independent_levels(mut self, independent: bool) -> Self {
        self.independent_levels = independent;
        self
    }

    /// Drop calls matching `exclude` before they are formatted
    #[must_use = "builder methods return a new value"]
    pub fn exclude(mut self, exclude: impl Exclude + 'static) -> Self {
        self.exclude = Some(Box::new(exclude));
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let output = self.output.unwrap_or_default();

        Logger {
            name: Arc::from(self.name),
            implied: Arc::from(Vec::new()),
            level: Arc::new(AtomicLevel::new(self.level.or_default_level())),
            independent_levels: self.independent_levels,
            shared: Arc::new(Shared {
                writer: Mutex::new(LogWriter::new(output, self.color)),
                formatter: Formatter::new(self.formatter),
                exclude: self.exclude,
                metrics: LoggerMetrics::new(),
            }),
        }
    }

    /// Build the Logger, rejecting a custom time pattern chrono cannot render
    pub fn try_build(self) -> Result<Logger> {
        if !self.formatter.timestamp_format.is_valid() {
            return Err(LoggerError::config(
                "time_format",
                format!("invalid pattern {:?}", self.formatter.timestamp_format),
            ));
        }
        Ok(self.build())
    }

    /// Build a logger that fans calls out to registered sinks
    pub fn build_intercept(self) -> InterceptLogger {
        InterceptLogger::new(self.build())
    }

    /// Build a logger for use as a sink of an [`InterceptLogger`]
    pub fn build_sink(self) -> Arc<dyn SinkAdapter> {
        Arc::new(self.build())
    }

    /// Build a logger that owns several destinations with their own levels
    pub fn build_multi_sink(self) -> MultiSinkLogger {
        MultiSinkLogger::from_builder(self)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
