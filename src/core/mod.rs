//! Core logger types and traits

pub mod error;
pub mod exclude;
pub mod intercept;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod multisink;
pub mod output_format;
pub mod printf;
pub mod record;
pub mod timestamp;
pub mod value;
pub mod writer;

pub use error::{LoggerError, Result};
pub use exclude::{Exclude, ExcludeByMessage, ExcludeByPrefix, ExcludeByRegexp, ExcludeFuncs};
pub use intercept::{InterceptLogger, SinkAdapter};
pub use log_level::{level_from_string, AtomicLevel, LogLevel, DEFAULT_LEVEL};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use multisink::{MultiSinkLogger, Sink, SinkOptions};
pub use output_format::{Formatter, FormatterConfig, OutputFormat, JSON_UNSUPPORTED_WARNING};
pub use record::{trim_caller_path, CallSite, Record};
pub use timestamp::{local_clock, TimeFn, TimestampFormat};
pub use value::{stacktrace, ObjectValue, Value, MISSING_KEY};
pub use writer::{
    ColorOption, Flushable, LeveledWriter, LogWriter, Output, OutputOptions, SharedBuffer,
    SharedWriter,
};
