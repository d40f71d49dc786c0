//! Logging macros for ergonomic key/value arguments.
//!
//! Each argument after the message is converted with `Value::from`, so keys
//! and values can be passed without wrapping them by hand.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::{info, printf};
//!
//! let buffer = SharedBuffer::default();
//! let logger = Logger::builder().output(buffer.clone()).disable_time(true).build();
//!
//! let port = 8080;
//! info!(logger, "Server started", "port", port);
//! info!(logger, "Throughput", "rate", printf!("%d req/s", 120));
//!
//! assert_eq!(
//!     buffer.contents(),
//!     "[INFO]  Server started: port=8080\n[INFO]  Throughput: rate=\"120 req/s\"\n"
//! );
//! ```

/// Build a `Vec<Value>` of alternating keys and values.
///
/// # Examples
///
/// ```
/// use rust_structured_logger::args;
///
/// let args = args!["user", "alice", "attempts", 3];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),*]
    };
}

/// Deferred printf-style value, expanded when the line is formatted.
///
/// # Examples
///
/// ```
/// use rust_structured_logger::printf;
///
/// let value = printf!("%s has %d items", "cart", 3);
/// ```
#[macro_export]
macro_rules! printf {
    ($template:expr $(, $arg:expr)* $(,)?) => {
        $crate::Value::fmt($template, ::std::vec![$($crate::Value::from($arg)),*])
    };
}

/// Log a message and key/value pairs at the given level.
///
/// The message and arguments are only evaluated when the logger is enabled
/// for `level`.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Request failed", "status", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log(
                level,
                ::core::convert::AsRef::<str>::as_ref(&$msg),
                &[$($crate::Value::from($arg)),*],
            )
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::trace;
/// trace!(logger, "Entering function", "fn", "calculate");
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::debug;
/// debug!(logger, "Counter", "value", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::info;
/// info!(logger, "Processing", "items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::warn;
/// warn!(logger, "Retrying", "attempt", 3, "max", 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::null();
/// use rust_structured_logger::error;
/// error!(logger, "Failed to connect to database", "error", "timeout");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, Logger, SharedBuffer, Value};

    fn capture(level: LogLevel) -> (SharedBuffer, Logger) {
        let buffer = SharedBuffer::default();
        let logger = Logger::builder()
            .level(level)
            .output(buffer.clone())
            .disable_time(true)
            .build();
        (buffer, logger)
    }

    #[test]
    fn test_args_macro() {
        let args: Vec<Value> = args!["a", 1, "b", true,];
        assert_eq!(args.len(), 4);
        assert!(matches!(args[1], Value::Int(1)));
        assert!(matches!(args[3], Value::Bool(true)));
    }

    #[test]
    fn test_log_macro() {
        let (buffer, logger) = capture(LogLevel::Info);
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Warn, String::from("owned"), "k", "v");
        assert_eq!(buffer.contents(), "[INFO]  Test message\n[WARN]  owned: k=v\n");
    }

    #[test]
    fn test_level_macros() {
        let (buffer, logger) = capture(LogLevel::Trace);
        trace!(logger, "t");
        debug!(logger, "d", "n", 1);
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e", "code", 500);
        assert_eq!(
            buffer.contents(),
            "[TRACE] t\n[DEBUG] d: n=1\n[INFO]  i\n[WARN]  w\n[ERROR] e: code=500\n"
        );
    }

    #[test]
    fn test_printf_macro() {
        let (buffer, logger) = capture(LogLevel::Info);
        info!(logger, "beans", "rate", printf!("%d beans/day", 12));
        assert_eq!(buffer.contents(), "[INFO]  beans: rate=\"12 beans/day\"\n");
    }

    #[test]
    fn test_macros_on_intercept_logger() {
        let buffer = SharedBuffer::default();
        let logger = Logger::builder()
            .output(buffer.clone())
            .disable_time(true)
            .build_intercept();
        info!(logger, "via intercept", "k", 1);
        assert_eq!(buffer.contents(), "[INFO]  via intercept: k=1\n");
    }

    #[test]
    fn test_disabled_call_skips_arguments() {
        use std::cell::Cell;

        let (buffer, logger) = capture(LogLevel::Warn);
        let evaluated = Cell::new(0);
        let expensive = || {
            evaluated.set(evaluated.get() + 1);
            Value::display(42)
        };

        debug!(logger, "skipped", "k", expensive());
        warn!(logger, "kept", "k", expensive());

        assert_eq!(evaluated.get(), 1);
        assert_eq!(buffer.contents(), "[WARN]  kept: k=42\n");
    }

    #[test]
    fn test_multi_sink_macro_reaches_lower_sink() {
        use crate::core::{Output, Sink, SinkOptions};

        let sink_out = SharedBuffer::default();
        let logger = Logger::builder()
            .level(LogLevel::Error)
            .output(std::io::sink())
            .disable_time(true)
            .build_multi_sink();
        logger.register_sink(Sink::new(SinkOptions {
            level: LogLevel::Debug,
            output: Some(Output::new(sink_out.clone())),
            ..SinkOptions::default()
        }));

        debug!(logger, "to sink", "n", 1);
        assert_eq!(sink_out.contents(), "[DEBUG] to sink: n=1\n");
    }
}
