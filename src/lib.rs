//! # Rust Structured Logger
//!
//! A leveled, structured logging library with human-readable and JSON
//! output, inherited key/value context and fan-out to secondary sinks.
//!
//! ## Features
//!
//! - **Leveled**: Trace through Error plus Off, checked before any formatting
//! - **Structured**: key/value arguments, `with` context and dotted names
//! - **Two formats**: aligned text lines or one JSON object per line
//! - **Fan-out**: intercept loggers and multi-sink loggers with per-sink levels
//!
//! ## Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let buffer = SharedBuffer::default();
//! let logger = Logger::builder()
//!     .name("test")
//!     .output(buffer.clone())
//!     .disable_time(true)
//!     .build();
//!
//! let request = logger.with(&["request_id".into(), "abc-123".into()]);
//! request.named("db").warn("slow query", &["ms".into(), 250.into()]);
//!
//! assert_eq!(
//!     buffer.contents(),
//!     "[WARN]  test.db: slow query: request_id=abc-123 ms=250\n"
//! );
//! ```

pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        ColorOption, Exclude, ExcludeByMessage, ExcludeByPrefix, ExcludeByRegexp, ExcludeFuncs,
        Flushable, InterceptLogger, LeveledWriter, LogLevel, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, MultiSinkLogger, Output, OutputFormat, OutputOptions, Result, SharedBuffer,
        Sink, SinkAdapter, SinkOptions, TimestampFormat, Value,
    };
}

pub use core::{
    level_from_string, stacktrace, ColorOption, Exclude, ExcludeByMessage, ExcludeByPrefix,
    ExcludeByRegexp, ExcludeFuncs, Flushable, FormatterConfig, InterceptLogger, LeveledWriter,
    LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, MultiSinkLogger, Output,
    OutputFormat, OutputOptions, Result, SharedBuffer, SharedWriter, Sink, SinkAdapter,
    SinkOptions, TimestampFormat, Value, DEFAULT_LEVEL, MISSING_KEY,
};
