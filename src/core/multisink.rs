//! Logger with per-destination thresholds and formats
//!
//! Unlike [`InterceptLogger`](crate::InterceptLogger), a [`MultiSinkLogger`]
//! owns its destinations directly. A record is rendered at most once per
//! output format and the bytes are reused for every destination that wants
//! that format.

use super::{
    exclude::Exclude,
    log_level::{AtomicLevel, LogLevel},
    logger::{merge_implied, LoggerBuilder},
    metrics::LoggerMetrics,
    output_format::{Formatter, OutputFormat},
    record::{CallSite, Record},
    value::Value,
    writer::{ColorOption, LogWriter, Output},
};
use parking_lot::Mutex;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Settings for one destination of a [`MultiSinkLogger`]
#[derive(Debug, Default)]
pub struct SinkOptions {
    pub level: LogLevel,
    pub json_format: bool,
    pub color: ColorOption,
    /// Stderr when unset
    pub output: Option<Output>,
}

/// A destination with its own threshold and format.
#[derive(Debug)]
pub struct Sink {
    level: LogLevel,
    format: OutputFormat,
    writer: Mutex<LogWriter>,
}

impl Sink {
    pub fn new(opts: SinkOptions) -> Arc<Sink> {
        let format = if opts.json_format {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        Arc::new(Sink {
            level: opts.level.or_default_level(),
            format,
            writer: Mutex::new(LogWriter::new(opts.output.unwrap_or_default(), opts.color)),
        })
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }
}

struct Shared {
    root_writer: Mutex<LogWriter>,
    root_format: OutputFormat,
    text: Formatter,
    json: Formatter,
    sinks: Mutex<Vec<Arc<Sink>>>,
    /// Lowest sink threshold, `Off` without sinks
    sinks_lowest: AtomicLevel,
    exclude: Option<Box<dyn Exclude>>,
    metrics: LoggerMetrics,
}

impl Shared {
    /// Callers hold the sinks lock.
    fn recompute_lowest(&self, sinks: &[Arc<Sink>]) {
        let lowest = sinks
            .iter()
            .map(|s| s.level)
            .fold(LogLevel::Off, std::cmp::min);
        self.sinks_lowest.store(lowest);
    }

    fn formatter(&self, format: OutputFormat) -> &Formatter {
        match format {
            OutputFormat::Text => &self.text,
            OutputFormat::Json => &self.json,
        }
    }

    fn write_line(&self, writer: &Mutex<LogWriter>, level: LogLevel, line: &[u8]) {
        let result = {
            let mut writer = writer.lock();
            writer.write(line);
            writer.flush(level)
        };

        match result {
            Ok(()) => {
                self.metrics.record_written();
            }
            Err(e) => {
                let failures = self.metrics.record_write_failure();
                if failures % 1000 == 0 {
                    eprintln!(
                        "[LOGGER ERROR] Failed to write log line ({} failures so far): {}",
                        failures + 1,
                        e
                    );
                }
            }
        }
    }
}

/// Lines rendered for one record, filled on first use.
#[derive(Default)]
struct RenderedLines {
    text: Option<Vec<u8>>,
    json: Option<Vec<u8>>,
}

impl RenderedLines {
    fn get(&mut self, shared: &Shared, format: OutputFormat, name: &str, record: &Record) -> &[u8] {
        let slot = match format {
            OutputFormat::Text => &mut self.text,
            OutputFormat::Json => &mut self.json,
        };
        slot.get_or_insert_with(|| shared.formatter(format).format(name, record))
    }
}

/// Logger fanning out to [`Sink`]s, each with its own level and format.
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let audit = SharedBuffer::default();
/// let logger = Logger::builder()
///     .output(std::io::sink())
///     .level(LogLevel::Warn)
///     .disable_time(true)
///     .build_multi_sink();
///
/// logger.register_sink(Sink::new(SinkOptions {
///     level: LogLevel::Debug,
///     json_format: true,
///     output: Some(Output::new(audit.clone())),
///     ..SinkOptions::default()
/// }));
///
/// logger.debug("cache miss", &["key".into(), "user:1".into()]);
/// assert_eq!(
///     audit.contents(),
///     "{\"@level\":\"debug\",\"@message\":\"cache miss\",\"key\":\"user:1\"}\n"
/// );
/// ```
#[derive(Clone)]
pub struct MultiSinkLogger {
    name: Arc<str>,
    implied: Arc<[Value]>,
    level: Arc<AtomicLevel>,
    independent_levels: bool,
    shared: Arc<Shared>,
}

impl MultiSinkLogger {
    pub(crate) fn from_builder(builder: LoggerBuilder) -> Self {
        let level = builder.level.or_default_level();
        let base = Formatter::new(builder.formatter);
        let root_format = base.output_format();

        MultiSinkLogger {
            name: Arc::from(builder.name),
            implied: Arc::from(Vec::new()),
            level: Arc::new(AtomicLevel::new(level)),
            independent_levels: builder.independent_levels,
            shared: Arc::new(Shared {
                root_writer: Mutex::new(LogWriter::new(
                    builder.output.unwrap_or_default(),
                    builder.color,
                )),
                root_format,
                text: base.with_output_format(OutputFormat::Text),
                json: base.with_output_format(OutputFormat::Json),
                sinks: Mutex::new(Vec::new()),
                sinks_lowest: AtomicLevel::new(LogLevel::Off),
                exclude: builder.exclude,
                metrics: LoggerMetrics::new(),
            }),
        }
    }

    fn derive(&self, name: Arc<str>, implied: Arc<[Value]>) -> Self {
        let level = if self.independent_levels {
            Arc::new(AtomicLevel::new(self.level.load()))
        } else {
            Arc::clone(&self.level)
        };

        MultiSinkLogger {
            name,
            implied,
            level,
            independent_levels: self.independent_levels,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Add `sink` and lower the overall threshold if needed
    pub fn register_sink(&self, sink: Arc<Sink>) {
        let mut sinks = self.shared.sinks.lock();
        if !sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            sinks.push(sink);
        }
        self.shared.recompute_lowest(&sinks);
    }

    /// Remove `sink` and raise the overall threshold if possible
    pub fn deregister_sink(&self, sink: &Arc<Sink>) {
        let mut sinks = self.shared.sinks.lock();
        sinks.retain(|s| !Arc::ptr_eq(s, sink));
        self.shared.recompute_lowest(&sinks);
    }

    pub fn sink_count(&self) -> usize {
        self.shared.sinks.lock().len()
    }

    /// Lowest threshold across this logger's root level and every sink
    pub fn lowest_level(&self) -> LogLevel {
        std::cmp::min(self.level.load(), self.shared.sinks_lowest.load())
    }

    /// Whether a call at `level` would reach the root output or any sink
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.lowest_level().enables(level)
    }

    fn emit(&self, level: LogLevel, msg: &str, args: &[Value], location: &'static Location<'static>) {
        if !self.enabled(level) {
            return;
        }

        if let Some(exclude) = &self.shared.exclude {
            if exclude.exclude(level, msg, args) {
                self.shared.metrics.record_excluded();
                return;
            }
        }

        let record = Record::new(level, msg, self.shared.text.now())
            .with_location(Some(CallSite::from(location)))
            .with_args(&self.implied, args);
        let mut lines = RenderedLines::default();

        let sinks = self.shared.sinks.lock().clone();
        for sink in sinks.iter().filter(|s| s.level.enables(level)) {
            let line = lines.get(&self.shared, sink.format, &self.name, &record);
            self.shared.write_line(&sink.writer, level, line);
        }

        if self.level.load().enables(level) {
            let line = lines.get(&self.shared, self.shared.root_format, &self.name, &record);
            self.shared.write_line(&self.shared.root_writer, level, line);
        }
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, msg: &str, args: &[Value]) {
        self.emit(level, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn trace(&self, msg: &str, args: &[Value]) {
        self.emit(LogLevel::Trace, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, args: &[Value]) {
        self.emit(LogLevel::Debug, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, args: &[Value]) {
        self.emit(LogLevel::Info, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, args: &[Value]) {
        self.emit(LogLevel::Warn, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, msg: &str, args: &[Value]) {
        self.emit(LogLevel::Error, msg, args, Location::caller());
    }

    /// Threshold of the root output
    pub fn level(&self) -> LogLevel {
        self.level.load()
    }

    /// Change the root threshold of this logger and every logger sharing
    /// its level cell
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level);
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

    pub fn with(&self, args: &[Value]) -> Self {
        self.derive(Arc::clone(&self.name), merge_implied(&self.implied, args))
    }

    pub fn named(&self, name: &str) -> Self {
        let name: Arc<str> = if self.name.is_empty() {
            Arc::from(name)
        } else {
            Arc::from(format!("{}.{}", self.name, name))
        };
        self.derive(name, Arc::clone(&self.implied))
    }

    pub fn reset_named(&self, name: &str) -> Self {
        self.derive(Arc::from(name), Arc::clone(&self.implied))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implied_args(&self) -> &[Value] {
        &self.implied
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }
}

impl fmt::Debug for MultiSinkLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSinkLogger")
            .field("name", &self.name)
            .field("level", &self.level.load())
            .field("lowest", &self.lowest_level())
            .field("sinks", &self.sink_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exclude::ExcludeByMessage;
    use crate::core::writer::SharedBuffer;
    use crate::Logger;
    use serde::{Serialize, Serializer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often it is rendered as text and as JSON.
    #[derive(Clone, Default)]
    struct RenderCounter {
        text: Arc<AtomicUsize>,
        json: Arc<AtomicUsize>,
    }

    impl fmt::Debug for RenderCounter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.text.fetch_add(1, Ordering::SeqCst);
            f.write_str("counted")
        }
    }

    impl Serialize for RenderCounter {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.json.fetch_add(1, Ordering::SeqCst);
            serializer.serialize_str("counted")
        }
    }

    fn multi(level: LogLevel) -> (SharedBuffer, MultiSinkLogger) {
        let buffer = SharedBuffer::default();
        let logger = Logger::builder()
            .name("multi")
            .level(level)
            .output(buffer.clone())
            .disable_time(true)
            .build_multi_sink();
        (buffer, logger)
    }

    fn sink(level: LogLevel, json_format: bool) -> (SharedBuffer, Arc<Sink>) {
        let buffer = SharedBuffer::default();
        let sink = Sink::new(SinkOptions {
            level,
            json_format,
            output: Some(Output::new(buffer.clone())),
            ..SinkOptions::default()
        });
        (buffer, sink)
    }

    #[test]
    fn test_lowest_level_tracks_sinks() {
        let (_, logger) = multi(LogLevel::Warn);
        assert_eq!(logger.lowest_level(), LogLevel::Warn);

        let (_, debug) = sink(LogLevel::Debug, false);
        logger.register_sink(Arc::clone(&debug));
        assert_eq!(logger.lowest_level(), LogLevel::Debug);

        logger.set_level(LogLevel::Trace);
        assert_eq!(logger.lowest_level(), LogLevel::Trace);

        logger.set_level(LogLevel::Error);
        assert_eq!(logger.lowest_level(), LogLevel::Debug);

        logger.deregister_sink(&debug);
        assert_eq!(logger.lowest_level(), LogLevel::Error);
    }

    #[test]
    fn test_each_destination_applies_its_own_level() {
        let (root, logger) = multi(LogLevel::Warn);
        let (text, text_sink) = sink(LogLevel::Debug, false);
        let (json, json_sink) = sink(LogLevel::Error, true);
        logger.register_sink(text_sink);
        logger.register_sink(json_sink);

        logger.trace("nobody", &[]);
        logger.debug("text only", &[]);
        logger.warn("root and text", &[]);
        logger.error("everyone", &["code".into(), 7.into()]);

        assert_eq!(
            root.contents(),
            "[WARN]  multi: root and text\n[ERROR] multi: everyone: code=7\n"
        );
        assert_eq!(
            text.contents(),
            "[DEBUG] multi: text only\n[WARN]  multi: root and text\n[ERROR] multi: everyone: code=7\n"
        );
        assert_eq!(
            json.contents(),
            "{\"@level\":\"error\",\"@message\":\"everyone\",\"@module\":\"multi\",\"code\":7}\n"
        );
    }

    #[test]
    fn test_deregistered_sink_stops_receiving() {
        let (_, logger) = multi(LogLevel::Info);
        let (out, s) = sink(LogLevel::Debug, false);

        logger.register_sink(Arc::clone(&s));
        logger.register_sink(Arc::clone(&s));
        assert_eq!(logger.sink_count(), 1);

        logger.debug("first", &[]);
        logger.deregister_sink(&s);
        logger.debug("second", &[]);

        assert_eq!(out.contents(), "[DEBUG] multi: first\n");
    }

    #[test]
    fn test_derived_loggers_share_sinks() {
        let (_, logger) = multi(LogLevel::Info);
        let (out, s) = sink(LogLevel::Info, false);
        logger.register_sink(s);

        logger.named("sub").with(&["a".into(), 1.into()]).info("hi", &[]);
        assert_eq!(out.contents(), "[INFO]  multi.sub: hi: a=1\n");
    }

    #[test]
    fn test_record_is_formatted_once_per_format() {
        let (root, logger) = multi(LogLevel::Info);
        let (text_a, s1) = sink(LogLevel::Info, false);
        let (text_b, s2) = sink(LogLevel::Info, false);
        let (json_a, s3) = sink(LogLevel::Info, true);
        let (json_b, s4) = sink(LogLevel::Info, true);
        for s in [s1, s2, s3, s4] {
            logger.register_sink(s);
        }

        let counter = RenderCounter::default();
        logger.info("once", &["obj".into(), Value::object(counter.clone())]);

        assert_eq!(counter.text.load(Ordering::SeqCst), 1);
        assert_eq!(counter.json.load(Ordering::SeqCst), 1);

        let text_line = "[INFO]  multi: once: obj=counted\n";
        let json_line = "{\"@level\":\"info\",\"@message\":\"once\",\"@module\":\"multi\",\"obj\":\"counted\"}\n";
        assert_eq!(root.contents(), text_line);
        assert_eq!(text_a.contents(), text_line);
        assert_eq!(text_b.contents(), text_line);
        assert_eq!(json_a.contents(), json_line);
        assert_eq!(json_b.contents(), json_line);
    }

    #[test]
    fn test_exclude_applies_to_root_and_sinks() {
        let root = SharedBuffer::default();
        let logger = Logger::builder()
            .output(root.clone())
            .disable_time(true)
            .exclude(ExcludeByMessage::new().with("noise"))
            .build_multi_sink();
        let (out, s) = sink(LogLevel::Debug, false);
        logger.register_sink(s);

        logger.info("noise", &[]);
        logger.info("signal", &[]);

        assert_eq!(root.contents(), "[INFO]  signal\n");
        assert_eq!(out.contents(), "[INFO]  signal\n");
        assert_eq!(logger.metrics().excluded_count(), 1);
    }

    #[test]
    fn test_independent_levels() {
        let root = SharedBuffer::default();
        let logger = Logger::builder()
            .name("multi")
            .output(root.clone())
            .disable_time(true)
            .independent_levels(true)
            .build_multi_sink();
        let child = logger.named("child");

        child.set_level(LogLevel::Error);
        assert_eq!(logger.level(), LogLevel::Info);
        assert_eq!(child.level(), LogLevel::Error);

        logger.warn("parent", &[]);
        child.warn("child", &[]);
        assert_eq!(root.contents(), "[WARN]  multi: parent\n");

        logger.set_level(LogLevel::Debug);
        assert_eq!(logger.lowest_level(), LogLevel::Debug);
        assert_eq!(child.lowest_level(), LogLevel::Error);
    }

    #[test]
    fn test_shared_level_by_default() {
        let (_, logger) = multi(LogLevel::Info);
        let child = logger.named("child");

        child.set_level(LogLevel::Error);
        assert_eq!(logger.level(), LogLevel::Error);
    }
}
