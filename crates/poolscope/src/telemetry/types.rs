use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// A primitive attribute or argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Maximum length for error messages in `SpanOutcome::Error`.
const MAX_ERROR_LEN: usize = 512;

/// How the intercepted call ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpanOutcome {
    Success,
    Error {
        /// Error category, e.g. the error type's name.
        kind: String,
        /// Error message (truncated to 512 bytes).
        message: String,
    },
}

impl SpanOutcome {
    /// Create an error outcome, truncating the message to avoid telemetry blow-up.
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.len() > MAX_ERROR_LEN {
            format!("{}...", super::truncate_bytes(&message, MAX_ERROR_LEN))
        } else {
            message
        };
        Self::Error {
            kind: kind.into(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SpanOutcome::Success)
    }

    /// Error category, if the call failed.
    pub fn error_kind(&self) -> Option<&str> {
        match self {
            SpanOutcome::Success => None,
            SpanOutcome::Error { kind, .. } => Some(kind),
        }
    }
}

impl fmt::Display for SpanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanOutcome::Success => f.write_str("success"),
            SpanOutcome::Error { kind, message } => write!(f, "error: {kind}: {message}"),
        }
    }
}

/// One intercepted call, as reported to the telemetry backend.
#[derive(Debug, Clone, Serialize)]
pub struct SpanEvent {
    pub span_id: Uuid,
    pub operation_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Monotonic duration of the wrapped call.
    #[serde(with = "duration_micros")]
    pub duration: Duration,
    pub outcome: SpanOutcome,
    pub attributes: BTreeMap<String, Value>,
}

impl SpanEvent {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

mod duration_micros {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }
}

/// Receives spans from the interceptor runtime.
///
/// Implementations must be cheap and must not block: `record` runs on the instrumented
/// application's thread, right after the wrapped call returns.
pub trait TelemetrySink: Send + Sync {
    /// Called once per intercepted call that produced a span.
    fn record(&self, span: &SpanEvent);
}
