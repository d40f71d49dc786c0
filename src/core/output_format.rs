//! Line formatting for log records
//!
//! Two output formats are supported:
//! - Text: `[<time> ]<TAG>[ file:line:] [name: ]message[: key=value ...]`
//! - Json: one object per line with `@`-prefixed reserved keys

use super::record::Record;
use super::timestamp::{local_clock, TimeFn, TimestampFormat};
use super::value::{needs_quoting, Value, MISSING_KEY};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Tag written for levels without a bracket of their own.
const UNKNOWN_LEVEL_TAG: &str = "[?????]";

/// Diagnostic attached when a record's values cannot be encoded.
pub const JSON_UNSUPPORTED_WARNING: &str = "logging contained values that don't serialize to json";

/// Output format for log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    ///
    /// Example: `2025-01-08T10:30:45.123Z [INFO]  app: request done: status=200`
    #[default]
    Text,

    /// JSON format for machine processing
    ///
    /// Example: `{"@level":"info","@message":"request done","@module":"app","status":200}`
    Json,
}

/// Settings shared by every line a formatter produces
#[derive(Clone)]
pub struct FormatterConfig {
    pub output_format: OutputFormat,
    pub timestamp_format: TimestampFormat,
    pub disable_time: bool,
    pub include_location: bool,
    pub time_fn: TimeFn,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Text,
            timestamp_format: TimestampFormat::Standard,
            disable_time: false,
            include_location: false,
            time_fn: local_clock(),
        }
    }
}

impl fmt::Debug for FormatterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterConfig")
            .field("output_format", &self.output_format)
            .field("timestamp_format", &self.timestamp_format)
            .field("disable_time", &self.disable_time)
            .field("include_location", &self.include_location)
            .finish_non_exhaustive()
    }
}

/// Renders records into newline-terminated bytes.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: FormatterConfig,
}

impl Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    /// Same settings, different output format.
    pub fn with_output_format(&self, output_format: OutputFormat) -> Self {
        let mut config = self.config.clone();
        config.output_format = output_format;
        Self { config }
    }

    /// Current time according to the configured clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.config.time_fn)()
    }

    /// Render `record` for a logger called `name`.
    pub fn format(&self, name: &str, record: &Record) -> Vec<u8> {
        match self.config.output_format {
            OutputFormat::Text => self.format_text(name, record),
            OutputFormat::Json => self.format_json(name, record),
        }
    }

    fn format_text(&self, name: &str, record: &Record) -> Vec<u8> {
        let mut buf = String::with_capacity(128);

        if !self.config.disable_time {
            buf.push_str(&self.config.timestamp_format.format_text(&record.timestamp));
            buf.push(' ');
        }

        buf.push_str(record.level.bracket().unwrap_or(UNKNOWN_LEVEL_TAG));

        if self.config.include_location {
            if let Some(site) = record.location {
                let _ = write!(buf, " {}:{}:", site.short_file(), site.line);
            }
        }

        buf.push(' ');

        if !name.is_empty() {
            buf.push_str(name);
            buf.push_str(": ");
        }

        buf.push_str(&record.message);

        let (pairs, mut stacktrace) = normalize_args(&record.args);

        if !record.args.is_empty() {
            buf.push(':');

            for pair in pairs.chunks_exact(2) {
                let (key, value) = (&pair[0], &pair[1]);

                if let Value::Stacktrace(trace) = value {
                    stacktrace = Some(trace.as_str());
                    continue;
                }

                let rendered = value.render();
                buf.push(' ');
                buf.push_str(&key.key_text());
                buf.push('=');

                if !rendered.raw && needs_quoting(&rendered.text) {
                    buf.push('"');
                    buf.push_str(&rendered.text);
                    buf.push('"');
                } else {
                    buf.push_str(&rendered.text);
                }
            }
        }

        buf.push('\n');

        if let Some(trace) = stacktrace {
            buf.push_str(trace);
            buf.push('\n');
        }

        buf.into_bytes()
    }

    fn format_json(&self, name: &str, record: &Record) -> Vec<u8> {
        let (pairs, stacktrace) = normalize_args(&record.args);

        let mut vals = self.json_header(name, record);
        if let Some(trace) = stacktrace {
            vals.insert(
                "stacktrace".to_string(),
                serde_json::Value::String(trace.to_string()),
            );
        }

        let encoded = pairs
            .chunks_exact(2)
            .try_for_each(|pair| {
                vals.insert(pair[0].key_text(), pair[1].to_json()?);
                Ok::<_, serde_json::Error>(())
            })
            .and_then(|()| serde_json::to_vec(&serde_json::Value::Object(vals)));

        let mut buf = match encoded {
            Ok(buf) => buf,
            Err(_) => {
                let mut plain = self.json_header(name, record);
                plain.insert(
                    "@warn".to_string(),
                    serde_json::Value::String(JSON_UNSUPPORTED_WARNING.to_string()),
                );
                serde_json::to_vec(&serde_json::Value::Object(plain)).unwrap_or_default()
            }
        };

        buf.push(b'\n');
        buf
    }

    fn json_header(&self, name: &str, record: &Record) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::Value as Json;

        let mut vals = serde_json::Map::new();
        vals.insert("@message".to_string(), Json::String(record.message.clone()));

        if !self.config.disable_time {
            vals.insert(
                "@timestamp".to_string(),
                Json::String(self.config.timestamp_format.format_json(&record.timestamp)),
            );
        }

        vals.insert(
            "@level".to_string(),
            Json::String(record.level.json_name().to_string()),
        );

        if !name.is_empty() {
            vals.insert("@module".to_string(), Json::String(name.to_string()));
        }

        if self.config.include_location {
            if let Some(site) = record.location {
                vals.insert(
                    "@caller".to_string(),
                    Json::String(format!("{}:{}", site.file, site.line)),
                );
            }
        }

        vals
    }
}

/// Pair up `args`.
///
/// An odd trailing stack trace is split off and returned separately; any
/// other odd trailing value is paired with [`MISSING_KEY`].
fn normalize_args(args: &[Value]) -> (Cow<'_, [Value]>, Option<&str>) {
    if args.len() % 2 == 0 {
        return (Cow::Borrowed(args), None);
    }

    let Some((last, rest)) = args.split_last() else {
        return (Cow::Borrowed(args), None);
    };

    match last {
        Value::Stacktrace(trace) => (Cow::Borrowed(rest), Some(trace.as_str())),
        extra => {
            let mut owned = Vec::with_capacity(args.len() + 1);
            owned.extend_from_slice(rest);
            owned.push(Value::from(MISSING_KEY));
            owned.push(extra.clone());
            (Cow::Owned(owned), None)
        }
    }
}
