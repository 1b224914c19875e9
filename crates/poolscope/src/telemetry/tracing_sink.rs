use super::truncate_bytes;
use super::types::{SpanEvent, SpanOutcome, TelemetrySink};
use tracing::Level;

/// A `tracing`-based sink that emits every span as an event under the
/// `poolscope.span` target.
#[derive(Debug, Clone)]
pub struct TracingSink {
    /// Tracing event level for successful spans.
    pub level: Level,
    /// Tracing event level for failed spans.
    pub error_level: Level,
    /// Truncate long error messages (in bytes). `None` means no truncation.
    pub max_message_length: Option<usize>,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            error_level: Level::WARN,
            max_message_length: Some(200),
        }
    }
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the level for successful spans.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Override the level for failed spans.
    pub fn error_level(mut self, level: Level) -> Self {
        self.error_level = level;
        self
    }

    /// Set maximum error message length to display.
    pub fn max_message_length(mut self, len: usize) -> Self {
        self.max_message_length = Some(len);
        self
    }

    /// Disable message truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_message_length = None;
        self
    }

    pub(crate) fn truncate(&self, message: &str) -> String {
        match self.max_message_length {
            Some(max) if message.len() > max => format!("{}...", truncate_bytes(message, max)),
            _ => message.to_string(),
        }
    }
}

impl TelemetrySink for TracingSink {
    fn record(&self, span: &SpanEvent) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let attributes = tracing::field::debug(&span.attributes);
        let duration_us = u64::try_from(span.duration.as_micros()).unwrap_or(u64::MAX);
        match &span.outcome {
            SpanOutcome::Success => emit_at_level!(
                self.level,
                target: "poolscope.span",
                span_id = %span.span_id,
                operation = %span.operation_name,
                duration_us,
                attributes = attributes,
                "span completed"
            ),
            SpanOutcome::Error { kind, message } => emit_at_level!(
                self.error_level,
                target: "poolscope.span",
                span_id = %span.span_id,
                operation = %span.operation_name,
                duration_us,
                error_kind = %kind,
                error = %self.truncate(message),
                attributes = attributes,
                "span failed"
            ),
        }
    }
}
