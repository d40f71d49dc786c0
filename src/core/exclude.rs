//! Predicates that drop log calls before any formatting happens

use super::log_level::LogLevel;
use super::value::Value;
use regex::Regex;
use std::collections::HashSet;

/// Decides whether a log call is dropped.
///
/// Receives the level, the message and the call's own arguments (without
/// the logger's implied arguments). Any `Fn(LogLevel, &str, &[Value]) -> bool`
/// closure implements this trait.
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::Exclude;
/// use rust_structured_logger::LogLevel;
///
/// let noisy = |_: LogLevel, msg: &str, _: &[rust_structured_logger::Value]| msg.starts_with("poll");
/// assert!(noisy.exclude(LogLevel::Info, "poll tick", &[]));
/// ```
pub trait Exclude: Send + Sync {
    fn exclude(&self, level: LogLevel, msg: &str, args: &[Value]) -> bool;
}

impl<F> Exclude for F
where
    F: Fn(LogLevel, &str, &[Value]) -> bool + Send + Sync,
{
    fn exclude(&self, level: LogLevel, msg: &str, args: &[Value]) -> bool {
        self(level, msg, args)
    }
}

/// Drops calls whose message is exactly one of a known set.
#[derive(Debug, Clone, Default)]
pub struct ExcludeByMessage {
    messages: HashSet<String>,
}

impl ExcludeByMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, msg: impl Into<String>) {
        self.messages.insert(msg.into());
    }

    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, msg: impl Into<String>) -> Self {
        self.add(msg);
        self
    }
}

impl Exclude for ExcludeByMessage {
    fn exclude(&self, _level: LogLevel, msg: &str, _args: &[Value]) -> bool {
        self.messages.contains(msg)
    }
}

/// Drops calls whose message starts with a prefix.
#[derive(Debug, Clone)]
pub struct ExcludeByPrefix(String);

impl ExcludeByPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl Exclude for ExcludeByPrefix {
    fn exclude(&self, _level: LogLevel, msg: &str, _args: &[Value]) -> bool {
        msg.starts_with(&self.0)
    }
}

/// Drops calls whose message matches a regular expression.
#[derive(Debug, Clone)]
pub struct ExcludeByRegexp {
    regexp: Regex,
}

impl ExcludeByRegexp {
    pub fn new(regexp: Regex) -> Self {
        Self { regexp }
    }

    /// Compile `pattern` first
    pub fn from_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::new)
    }
}

impl Exclude for ExcludeByRegexp {
    fn exclude(&self, _level: LogLevel, msg: &str, _args: &[Value]) -> bool {
        self.regexp.is_match(msg)
    }
}

/// Drops a call if any of its members would.
#[derive(Default)]
pub struct ExcludeFuncs(Vec<Box<dyn Exclude>>);

impl ExcludeFuncs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exclude: impl Exclude + 'static) {
        self.0.push(Box::new(exclude));
    }

    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, exclude: impl Exclude + 'static) -> Self {
        self.push(exclude);
        self
    }
}

impl Exclude for ExcludeFuncs {
    fn exclude(&self, level: LogLevel, msg: &str, args: &[Value]) -> bool {
        self.0.iter().any(|f| f.exclude(level, msg, args))
    }
}
