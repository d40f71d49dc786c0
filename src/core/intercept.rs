//! Sink fan-out around a core logger
//!
//! An [`InterceptLogger`] logs every call through its own root logger and
//! then hands the same call to each registered [`SinkAdapter`]. Every sink
//! applies its own level threshold and format.

use super::{
    error::Result,
    log_level::LogLevel,
    logger::Logger,
    metrics::LoggerMetrics,
    value::Value,
    writer::{Flushable, OutputOptions},
};
use parking_lot::Mutex;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives log calls forwarded by an [`InterceptLogger`].
///
/// `args` already contains the intercept logger's implied arguments
/// followed by the call's own.
pub trait SinkAdapter: Send + Sync {
    fn accept(&self, name: &str, level: LogLevel, msg: &str, args: &[Value]);

    /// Like [`accept`](SinkAdapter::accept), with the call site of the
    /// original logging call
    fn accept_at(
        &self,
        name: &str,
        level: LogLevel,
        msg: &str,
        args: &[Value],
        location: Option<&'static Location<'static>>,
    ) {
        let _ = location;
        self.accept(name, level, msg, args);
    }
}

/// Sinks are identified by the allocation they point to.
fn same_sink(a: &Arc<dyn SinkAdapter>, b: &Arc<dyn SinkAdapter>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Set of registered sinks plus a counter readable without the lock.
#[derive(Default)]
struct SinkRegistry {
    count: AtomicUsize,
    sinks: Mutex<Vec<Arc<dyn SinkAdapter>>>,
}

impl SinkRegistry {
    fn register(&self, sink: Arc<dyn SinkAdapter>) {
        let mut sinks = self.sinks.lock();
        if sinks.iter().any(|s| same_sink(s, &sink)) {
            return;
        }
        sinks.push(sink);
        self.count.store(sinks.len(), Ordering::Release);
    }

    fn deregister(&self, sink: &Arc<dyn SinkAdapter>) {
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain(|s| !same_sink(s, sink));
        if sinks.len() != before {
            self.count.store(sinks.len(), Ordering::Release);
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.count.load(Ordering::Acquire) == 0
    }

    fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Copy of the current members; the lock is released before returning
    /// so sinks may deregister themselves while being called.
    fn snapshot(&self) -> Vec<Arc<dyn SinkAdapter>> {
        self.sinks.lock().clone()
    }
}

/// Logger that also forwards every call to registered sinks.
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let root = SharedBuffer::default();
/// let debug_lines = SharedBuffer::default();
///
/// let logger = Logger::builder()
///     .output(root.clone())
///     .disable_time(true)
///     .build_intercept();
/// let sink = Logger::builder()
///     .level(LogLevel::Debug)
///     .output(debug_lines.clone())
///     .disable_time(true)
///     .build_sink();
///
/// logger.register_sink(sink.clone());
/// logger.debug("only the sink sees this", &[]);
///
/// assert_eq!(root.contents(), "");
/// assert_eq!(debug_lines.contents(), "[DEBUG] only the sink sees this\n");
/// ```
#[derive(Clone)]
pub struct InterceptLogger {
    root: Logger,
    registry: Arc<SinkRegistry>,
}

impl InterceptLogger {
    /// Wrap `root`, starting with no sinks
    pub fn new(root: Logger) -> Self {
        Self {
            root,
            registry: Arc::new(SinkRegistry::default()),
        }
    }

    fn derive(&self, root: Logger) -> Self {
        Self {
            root,
            registry: Arc::clone(&self.registry),
        }
    }

    fn dispatch(
        &self,
        level: LogLevel,
        msg: &str,
        args: &[Value],
        location: &'static Location<'static>,
    ) {
        self.root.emit(self.root.name(), level, msg, args, Some(location));

        if self.registry.is_empty() {
            return;
        }

        let implied = self.root.implied_args();
        let merged: Vec<Value> = implied.iter().chain(args).cloned().collect();
        let name = self.root.name();

        for sink in self.registry.snapshot() {
            sink.accept_at(name, level, msg, &merged, Some(location));
            self.root.metrics().record_sink_dispatch();
        }
    }

    /// Add `sink`; registering the same sink twice has no effect
    pub fn register_sink(&self, sink: Arc<dyn SinkAdapter>) {
        self.registry.register(sink);
    }

    /// Remove `sink`; unknown sinks are ignored
    pub fn deregister_sink(&self, sink: &Arc<dyn SinkAdapter>) {
        self.registry.deregister(sink);
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.registry.len()
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, msg: &str, args: &[Value]) {
        self.dispatch(level, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn trace(&self, msg: &str, args: &[Value]) {
        self.dispatch(LogLevel::Trace, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, args: &[Value]) {
        self.dispatch(LogLevel::Debug, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, args: &[Value]) {
        self.dispatch(LogLevel::Info, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, args: &[Value]) {
        self.dispatch(LogLevel::Warn, msg, args, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, msg: &str, args: &[Value]) {
        self.dispatch(LogLevel::Error, msg, args, Location::caller());
    }

    /// Whether a call at `level` would reach anything. Registered sinks
    /// apply their own thresholds, so any sink makes every level enabled.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.root.enabled(level) || (level != LogLevel::Off && !self.registry.is_empty())
    }

    pub fn is_trace(&self) -> bool {
        self.root.is_trace()
    }

    pub fn is_debug(&self) -> bool {
        self.root.is_debug()
    }

    pub fn is_info(&self) -> bool {
        self.root.is_info()
    }

    pub fn is_warn(&self) -> bool {
        self.root.is_warn()
    }

    pub fn is_error(&self) -> bool {
        self.root.is_error()
    }

    /// Root logger threshold; sinks keep their own
    pub fn level(&self) -> LogLevel {
        self.root.level()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.root.set_level(level);
    }

    /// Derived intercept logger sharing this one's sinks
    pub fn with(&self, args: &[Value]) -> InterceptLogger {
        self.derive(self.root.with(args))
    }

    pub fn named(&self, name: &str) -> InterceptLogger {
        self.derive(self.root.named(name))
    }

    pub fn reset_named(&self, name: &str) -> InterceptLogger {
        self.derive(self.root.reset_named(name))
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn implied_args(&self) -> &[Value] {
        self.root.implied_args()
    }

    /// The wrapped logger, which does not forward to sinks
    pub fn root(&self) -> &Logger {
        &self.root
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.root.metrics()
    }

    /// Replace the root logger's output; sinks are unaffected
    pub fn reset_output(&self, opts: OutputOptions) -> Result<()> {
        self.root.reset_output(opts)
    }

    pub fn reset_output_with_flush(
        &self,
        opts: OutputOptions,
        flushable: &dyn Flushable,
    ) -> Result<()> {
        self.root.reset_output_with_flush(opts, flushable)
    }
}

impl fmt::Debug for InterceptLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptLogger")
            .field("root", &self.root)
            .field("sinks", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::writer::SharedBuffer;

    /// Sink that records what it was given.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, LogLevel, String, usize)>>,
    }

    impl SinkAdapter for Recorder {
        fn accept(&self, name: &str, level: LogLevel, msg: &str, args: &[Value]) {
            self.calls
                .lock()
                .push((name.to_string(), level, msg.to_string(), args.len()));
        }
    }

    fn intercept(level: LogLevel) -> (SharedBuffer, InterceptLogger) {
        let buffer = SharedBuffer::default();
        let logger = Logger::builder()
            .name("with_test")
            .level(level)
            .output(buffer.clone())
            .disable_time(true)
            .build_intercept();
        (buffer, logger)
    }

    #[test]
    fn test_register_is_idempotent() {
        let (_, logger) = intercept(LogLevel::Info);
        let sink: Arc<dyn SinkAdapter> = Arc::new(Recorder::default());

        logger.register_sink(Arc::clone(&sink));
        logger.register_sink(Arc::clone(&sink));
        assert_eq!(logger.sink_count(), 1);

        logger.deregister_sink(&sink);
        logger.deregister_sink(&sink);
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn test_sink_sees_levels_root_suppresses() {
        let (root, logger) = intercept(LogLevel::Info);
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn SinkAdapter> = recorder.clone();
        logger.register_sink(Arc::clone(&sink));

        logger.debug("test log", &["who".into(), "programmer".into()]);

        assert_eq!(root.contents(), "");
        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("with_test".to_string(), LogLevel::Debug, "test log".to_string(), 2));
    }

    #[test]
    fn test_sink_receives_implied_args() {
        let (_, logger) = intercept(LogLevel::Info);
        let recorder = Arc::new(Recorder::default());
        logger.register_sink(recorder.clone());

        let derived = logger.with(&["a".into(), 1.into()]).named("sub");
        derived.info("msg", &["b".into(), 2.into()]);

        let calls = recorder.calls.lock();
        assert_eq!(calls[0].0, "with_test.sub");
        assert_eq!(calls[0].3, 4);
        assert_eq!(logger.metrics().sink_dispatches(), 1);
    }

    #[test]
    fn test_no_delivery_after_deregister() {
        let (_, logger) = intercept(LogLevel::Info);
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn SinkAdapter> = recorder.clone();

        logger.register_sink(Arc::clone(&sink));
        logger.info("first", &[]);
        logger.deregister_sink(&sink);
        logger.info("second", &[]);

        assert_eq!(recorder.calls.lock().len(), 1);
    }

    struct SelfRemoving {
        owner: InterceptLogger,
        me: Mutex<Option<Arc<dyn SinkAdapter>>>,
        seen: AtomicUsize,
    }

    impl SinkAdapter for SelfRemoving {
        fn accept(&self, _name: &str, _level: LogLevel, _msg: &str, _args: &[Value]) {
            self.seen.fetch_add(1, Ordering::Relaxed);
            if let Some(me) = self.me.lock().take() {
                self.owner.deregister_sink(&me);
            }
        }
    }

    #[test]
    fn test_sink_can_deregister_itself() {
        let (_, logger) = intercept(LogLevel::Info);
        let sink = Arc::new(SelfRemoving {
            owner: logger.clone(),
            me: Mutex::new(None),
            seen: AtomicUsize::new(0),
        });
        let dyn_sink: Arc<dyn SinkAdapter> = sink.clone();
        *sink.me.lock() = Some(Arc::clone(&dyn_sink));

        logger.register_sink(dyn_sink);
        logger.info("once", &[]);
        logger.info("twice", &[]);

        assert_eq!(sink.seen.load(Ordering::Relaxed), 1);
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn test_sink_logger_formats_independently() {
        let (root, logger) = intercept(LogLevel::Info);
        let json = SharedBuffer::default();
        let sink = Logger::builder()
            .json_format(true)
            .level(LogLevel::Warn)
            .output(json.clone())
            .disable_time(true)
            .build_sink();
        logger.register_sink(sink);

        logger.info("root only", &[]);
        logger.warn("both", &["k".into(), "v".into()]);

        assert_eq!(root.contents(), "[INFO]  with_test: root only\n[WARN]  with_test: both: k=v\n");
        assert_eq!(
            json.contents(),
            "{\"@level\":\"warn\",\"@message\":\"both\",\"@module\":\"with_test\",\"k\":\"v\"}\n"
        );
    }

    #[test]
    fn test_set_level_only_affects_root() {
        let (root, logger) = intercept(LogLevel::Info);
        let recorder = Arc::new(Recorder::default());
        logger.register_sink(recorder.clone());

        logger.set_level(LogLevel::Off);
        logger.error("muted root", &[]);

        assert_eq!(root.contents(), "");
        assert_eq!(recorder.calls.lock().len(), 1);
    }

    #[test]
    fn test_dispatch_counts_calls_the_sink_drops() {
        let (_, logger) = intercept(LogLevel::Info);
        let out = SharedBuffer::default();
        let sink = Logger::builder()
            .level(LogLevel::Error)
            .output(out.clone())
            .build_sink();
        logger.register_sink(sink);

        logger.info("offered", &[]);

        assert_eq!(out.contents(), "");
        assert_eq!(logger.metrics().sink_dispatches(), 1);
    }

    #[test]
    fn test_enabled_accounts_for_sinks() {
        let (_, logger) = intercept(LogLevel::Warn);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(logger.enabled(LogLevel::Warn));

        let sink: Arc<dyn SinkAdapter> = Arc::new(Recorder::default());
        logger.register_sink(Arc::clone(&sink));
        assert!(logger.enabled(LogLevel::Debug));
        assert!(!logger.enabled(LogLevel::Off));

        logger.deregister_sink(&sink);
        assert!(!logger.enabled(LogLevel::Debug));
    }
}
