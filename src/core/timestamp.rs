//! Timestamp formatting utilities
//!
//! Provides the timestamp layouts used by the text and JSON formats and the
//! clock abstraction loggers read the current time from.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

/// Source of the current time for log records.
pub type TimeFn = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// The local wall clock.
pub fn local_clock() -> TimeFn {
    Arc::new(|| Local::now().fixed_offset())
}

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_structured_logger::core::TimestampFormat;
/// use chrono::{FixedOffset, TimeZone};
///
/// let ts = FixedOffset::east_opt(0)
///     .unwrap()
///     .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
///     .unwrap();
/// assert_eq!(TimestampFormat::Standard.format_text(&ts), "2025-01-08T10:30:45.000Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Millisecond precision in text output (`2025-01-08T10:30:45.123Z`,
    /// `2025-01-08T10:30:45.123+0100`), microsecond precision with a
    /// colon in the offset for JSON (`2025-01-08T10:30:45.123456+01:00`).
    #[default]
    Standard,

    /// ISO 8601 with microseconds in both formats
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format, used for both text and JSON output
    ///
    /// ```
    /// use rust_structured_logger::core::TimestampFormat;
    ///
    /// let kitchen = TimestampFormat::Custom("%-I:%M%p".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    /// Build from a strftime pattern; an empty pattern selects `Standard`.
    pub fn from_pattern(pattern: &str) -> Self {
        if pattern.is_empty() {
            TimestampFormat::Standard
        } else {
            TimestampFormat::Custom(pattern.to_string())
        }
    }

    /// Format for the text output
    #[must_use]
    pub fn format_text(&self, datetime: &DateTime<FixedOffset>) -> String {
        match self {
            TimestampFormat::Standard => {
                let base = datetime.format("%Y-%m-%dT%H:%M:%S%.3f");
                if datetime.offset().local_minus_utc() == 0 {
                    format!("{}Z", base)
                } else {
                    format!("{}{}", base, datetime.format("%z"))
                }
            }
            other => other.format_common(datetime),
        }
    }

    /// Format for the `@timestamp` JSON field
    #[must_use]
    pub fn format_json(&self, datetime: &DateTime<FixedOffset>) -> String {
        match self {
            TimestampFormat::Standard => {
                let base = datetime.format("%Y-%m-%dT%H:%M:%S%.6f");
                if datetime.offset().local_minus_utc() == 0 {
                    format!("{}Z", base)
                } else {
                    format!("{}{}", base, datetime.format("%:z"))
                }
            }
            other => other.format_common(datetime),
        }
    }

    fn format_common(&self, datetime: &DateTime<FixedOffset>) -> String {
        match self {
            TimestampFormat::Standard | TimestampFormat::Iso8601Micros => {
                datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
            }
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                // Unknown specifiers make chrono's Display fail.
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    out = datetime.to_rfc3339();
                }
                out
            }
        }
    }

    /// Check that a custom pattern only uses known strftime specifiers
    pub fn is_valid(&self) -> bool {
        match self {
            TimestampFormat::Custom(format_str) => chrono::format::StrftimeItems::new(format_str)
                .all(|item| !matches!(item, chrono::format::Item::Error)),
            _ => true,
        }
    }
}
