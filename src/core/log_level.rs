//! Log level definitions

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Level used when a logger is built without one.
pub const DEFAULT_LEVEL: LogLevel = LogLevel::Info;

/// Severity of a log call.
///
/// Levels are totally ordered. `NoLevel` is the "unset" sentinel and sorts
/// below everything; `Off` sorts above `Error` and, as a threshold,
/// suppresses all output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    NoLevel = 0,
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Off = 6,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::NoLevel => "none",
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Fixed-width tag used by the text format, `None` for levels that
    /// are never emitted on their own.
    pub fn bracket(&self) -> Option<&'static str> {
        match self {
            LogLevel::Trace => Some("[TRACE]"),
            LogLevel::Debug => Some("[DEBUG]"),
            LogLevel::Info => Some("[INFO] "),
            LogLevel::Warn => Some("[WARN] "),
            LogLevel::Error => Some("[ERROR]"),
            LogLevel::NoLevel | LogLevel::Off => None,
        }
    }

    /// Name used for the `@level` JSON field.
    pub fn json_name(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::NoLevel | LogLevel::Off => "all",
        }
    }

    pub fn color_code(&self) -> Option<colored::Color> {
        use colored::Color::*;
        match self {
            LogLevel::Trace => Some(BrightGreen),
            LogLevel::Debug => Some(White),
            LogLevel::Info => Some(Blue),
            LogLevel::Warn => Some(BrightYellow),
            LogLevel::Error => Some(BrightRed),
            LogLevel::NoLevel | LogLevel::Off => None,
        }
    }

    /// Whether a call at `level` passes this threshold.
    #[inline]
    pub fn enables(&self, level: LogLevel) -> bool {
        *self != LogLevel::Off && level != LogLevel::Off && level >= *self
    }

    /// Resolve the unset sentinel to [`DEFAULT_LEVEL`].
    #[inline]
    pub fn or_default_level(self) -> LogLevel {
        if self == LogLevel::NoLevel {
            DEFAULT_LEVEL
        } else {
            self
        }
    }

    pub(crate) fn from_u8(value: u8) -> LogLevel {
        match value {
            1 => LogLevel::Trace,
            2 => LogLevel::Debug,
            3 => LogLevel::Info,
            4 => LogLevel::Warn,
            5 => LogLevel::Error,
            6 => LogLevel::Off,
            _ => LogLevel::NoLevel,
        }
    }
}

/// Lenient parse: unknown names map to [`LogLevel::NoLevel`].
pub fn level_from_string(s: &str) -> LogLevel {
    s.parse().unwrap_or(LogLevel::NoLevel)
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            _ => Err(LoggerError::invalid_level(s)),
        }
    }
}

/// Level threshold that can be read without taking any lock.
#[derive(Debug)]
pub struct AtomicLevel(AtomicU8);

impl AtomicLevel {
    pub fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    #[inline]
    pub fn load(&self) -> LogLevel {
        LogLevel::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, level: LogLevel) {
        self.0.store(level as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_total() {
        assert!(LogLevel::NoLevel < LogLevel::Trace);
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Off);
    }

    #[test]
    fn test_enables() {
        assert!(LogLevel::Info.enables(LogLevel::Info));
        assert!(LogLevel::Info.enables(LogLevel::Error));
        assert!(!LogLevel::Info.enables(LogLevel::Debug));
        assert!(!LogLevel::Off.enables(LogLevel::Error));
        assert!(!LogLevel::Trace.enables(LogLevel::Off));
    }

    #[test]
    fn test_parse() {
        assert_eq!("TRACE".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!(" warn ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_from_string_is_lenient() {
        assert_eq!(level_from_string("Debug"), LogLevel::Debug);
        assert_eq!(level_from_string("nonsense"), LogLevel::NoLevel);
        assert_eq!(level_from_string(""), LogLevel::NoLevel);
    }

    #[test]
    fn test_unset_resolves_to_info() {
        assert_eq!(LogLevel::NoLevel.or_default_level(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.or_default_level(), LogLevel::Warn);
    }

    #[test]
    fn test_brackets_are_fixed_width() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(level.bracket().map(str::len), Some(7));
        }
        assert_eq!(LogLevel::Off.bracket(), None);
    }

    #[test]
    fn test_atomic_level() {
        let cell = AtomicLevel::new(LogLevel::Warn);
        assert_eq!(cell.load(), LogLevel::Warn);
        cell.store(LogLevel::Trace);
        assert_eq!(cell.load(), LogLevel::Trace);
    }
}
