//! Values attached to log calls as key/value arguments
//!
//! Arguments are passed as a flat, alternating `key, value, key, value`
//! sequence of [`Value`]s. Rendering is resolved by matching on the
//! variant, both for the text format and for JSON.

use super::printf;
use serde::Serialize;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

/// Key paired with a value that was passed without one.
pub const MISSING_KEY: &str = "EXTRA_VALUE_AT_END";

/// Characters that force a text value to be double-quoted.
const QUOTE_TRIGGERS: &[char] = &[' ', '\t', '\n', '\r'];

/// A value whose JSON form is produced by `serde`.
///
/// Text output uses the `Debug` representation.
pub trait ObjectValue: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

struct Serialized<T>(T);

impl<T: fmt::Debug> fmt::Debug for Serialized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> ObjectValue for Serialized<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.0)
    }
}

/// Value type for key/value log arguments
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Rendered as `0x` followed by lowercase hex digits
    Hex(i64),
    /// Rendered as `0` followed by octal digits
    Octal(i64),
    /// Rendered as `0b` followed by binary digits
    Binary(i64),
    /// Always double-quoted, with control characters escaped
    Quote(String),
    /// printf-style template plus its arguments, expanded at format time
    Format(String, Vec<Value>),
    Slice(Vec<Value>),
    /// Message of an error value
    Error(String),
    /// Pre-serialized JSON, emitted unchanged in JSON output
    Json(serde_json::Value),
    Object(Arc<dyn ObjectValue>),
    /// Captured stack trace, appended after the log line
    Stacktrace(String),
    /// Generic `Display` conversion
    Raw(String),
}

/// Text form of a value plus whether it is exempt from quoting.
pub(crate) struct Rendered {
    pub text: String,
    pub raw: bool,
}

impl Value {
    pub fn hex(value: i64) -> Self {
        Value::Hex(value)
    }

    pub fn octal(value: i64) -> Self {
        Value::Octal(value)
    }

    pub fn binary(value: i64) -> Self {
        Value::Binary(value)
    }

    pub fn quote(value: impl Into<String>) -> Self {
        Value::Quote(value.into())
    }

    /// Deferred printf-style formatting, see [`printf!`](crate::printf).
    pub fn fmt(template: impl Into<String>, args: Vec<Value>) -> Self {
        Value::Format(template.into(), args)
    }

    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Value::Error(err.to_string())
    }

    pub fn display(value: impl fmt::Display) -> Self {
        Value::Raw(value.to_string())
    }

    pub fn json(value: serde_json::Value) -> Self {
        Value::Json(value)
    }

    /// Wrap any serializable value. If serialization fails at format time
    /// the JSON formatter falls back to a diagnostic-only record.
    pub fn object<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Value::Object(Arc::new(Serialized(value)))
    }

    pub fn is_stacktrace(&self) -> bool {
        matches!(self, Value::Stacktrace(_))
    }

    /// Text used when this value is in key position.
    pub(crate) fn key_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.render().text,
        }
    }

    /// Text form for the text formatter, before quoting.
    pub(crate) fn render(&self) -> Rendered {
        let text = match self {
            Value::String(s) if s.is_empty() => {
                return Rendered {
                    text: "\"\"".to_string(),
                    raw: true,
                }
            }
            Value::Quote(s) => {
                return Rendered {
                    text: go_quote(s),
                    raw: true,
                }
            }
            Value::Slice(items) => {
                return Rendered {
                    text: render_slice(items),
                    raw: true,
                }
            }
            other => other.plain_text(),
        };
        Rendered { text, raw: false }
    }

    /// Unquoted text form, also used for printf `%v` and slice elements.
    pub(crate) fn plain_text(&self) -> String {
        match self {
            Value::String(s) | Value::Raw(s) | Value::Error(s) | Value::Stacktrace(s) => {
                s.clone()
            }
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Hex(v) => format!("0x{:x}", *v as u64),
            Value::Octal(v) => format!("0{:o}", *v as u64),
            Value::Binary(v) => format!("0b{:b}", *v as u64),
            Value::Quote(s) => go_quote(s),
            Value::Format(template, args) => printf::sprintf(template, args),
            Value::Slice(items) => {
                let inner: Vec<String> = items.iter().map(Value::plain_text).collect();
                format!("[{}]", inner.join(" "))
            }
            Value::Json(serde_json::Value::String(s)) => s.clone(),
            Value::Json(v) => v.to_string(),
            Value::Object(obj) => format!("{:?}", obj),
        }
    }

    /// JSON form; fails for values JSON cannot represent.
    pub(crate) fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::String(s) | Value::Raw(s) | Value::Error(s) | Value::Stacktrace(s) => {
                Json::String(s.clone())
            }
            Value::Quote(s) => Json::String(s.clone()),
            Value::Int(i) | Value::Hex(i) | Value::Octal(i) | Value::Binary(i) => {
                Json::Number((*i).into())
            }
            Value::Uint(u) => Json::Number((*u).into()),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Json::Number(n),
                None => {
                    return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                        "unsupported float value: {}",
                        f
                    )))
                }
            },
            Value::Bool(b) => Json::Bool(*b),
            Value::Format(template, args) => Json::String(printf::sprintf(template, args)),
            Value::Slice(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<serde_json::Result<Vec<_>>>()?,
            ),
            Value::Json(v) => v.clone(),
            Value::Object(obj) => obj.to_json()?,
        })
    }
}

/// Whether a text value must be wrapped in double quotes.
pub(crate) fn needs_quoting(text: &str) -> bool {
    text.contains(QUOTE_TRIGGERS)
}

fn render_slice(items: &[Value]) -> String {
    let mut buf = String::from("[");

    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_str(", ");
        }

        let text = item.plain_text();
        if needs_quoting(&text) {
            buf.push('"');
            buf.push_str(&text);
            buf.push('"');
        } else {
            buf.push_str(&text);
        }
    }

    buf.push(']');
    buf
}

/// Double-quote `s`, escaping quotes, backslashes and control characters.
pub(crate) fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if c.is_control() && (c as u32) < 0x80 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Capture the current stack as a value.
///
/// Passed as the last argument of a log call, the trace is written after
/// the log line instead of as a key/value pair.
pub fn stacktrace() -> Value {
    Value::Stacktrace(Backtrace::force_capture().to_string())
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(Uint, u64: u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Slice(items.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}
