//! Span-like telemetry emitted by intercepted calls.
//!
//! The runtime builds one [`SpanEvent`] per intercepted call and hands it to a
//! [`TelemetrySink`]. Sinks provided here:
//! - [`NoopSink`]: discards everything (default)
//! - [`CollectingSink`]: keeps spans in memory
//! - [`StatsSink`]: aggregates counts and durations per operation
//! - [`TracingSink`]: emits each span as a `tracing` event
//! - [`CompositeSink`]: fans out to several sinks
//!
//! # Example
//!
//! ```rust,ignore
//! use poolscope::telemetry::{CompositeSink, StatsSink, TracingSink};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsSink::new());
//! let sink = CompositeSink::new()
//!     .add(TracingSink::new())
//!     .add_arc(stats.clone());
//!
//! let agent = Agent::builder().sink(sink).build()?;
//! ```

mod sinks;
mod tracing_sink;
mod types;


pub use sinks::{CollectingSink, CompositeSink, NoopSink, OperationStats, StatsSink};
pub use tracing_sink::TracingSink;
pub use types::{SpanEvent, SpanOutcome, TelemetrySink, Value};

pub(crate) fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
