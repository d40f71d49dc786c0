//! Per-call log record

use super::log_level::LogLevel;
use super::value::Value;
use chrono::{DateTime, FixedOffset};
use std::panic::Location;

/// Source position of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    /// Last two path segments of the file, as shown in text output.
    pub fn short_file(&self) -> &'static str {
        trim_caller_path(self.file)
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// Keep only the last two segments of `path`.
pub fn trim_caller_path(path: &str) -> &str {
    let is_sep = |c: char| c == '/' || c == '\\';

    let Some(last) = path.rfind(is_sep) else {
        return path;
    };
    match path[..last].rfind(is_sep) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// One log call, built after the level check passed.
///
/// `args` holds the logger's implied arguments followed by the call's
/// own arguments.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<FixedOffset>,
    pub location: Option<CallSite>,
    pub args: Vec<Value>,
}

impl Record {
    pub fn new(level: LogLevel, message: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp,
            location: None,
            args: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Option<CallSite>) -> Self {
        self.location = location;
        self
    }

    /// Set the arguments to `implied` followed by `args`.
    pub fn with_args(mut self, implied: &[Value], args: &[Value]) -> Self {
        let mut merged = Vec::with_capacity(implied.len() + args.len());
        merged.extend_from_slice(implied);
        merged.extend_from_slice(args);
        self.args = merged;
        self
    }
}
