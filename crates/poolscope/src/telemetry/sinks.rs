use super::types::{SpanEvent, TelemetrySink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A sink that discards every span.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn record(&self, _span: &SpanEvent) {}
}

/// A sink that keeps every span in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    spans: Mutex<Vec<SpanEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the spans recorded so far.
    pub fn spans(&self) -> Vec<SpanEvent> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the spans recorded so far.
    pub fn take(&self) -> Vec<SpanEvent> {
        std::mem::take(&mut *self.spans.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for CollectingSink {
    fn record(&self, span: &SpanEvent) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span.clone());
    }
}

/// Aggregated statistics for one operation name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStats {
    /// Number of spans recorded.
    pub calls: u64,
    /// Number of spans with an error outcome.
    pub errors: u64,
    /// Total duration.
    pub total_duration: Duration,
    /// Slowest call.
    pub max_duration: Duration,
}

/// A sink that tracks call statistics.
#[derive(Debug, Default)]
pub struct StatsSink {
    total_spans: AtomicU64,
    failed_spans: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
    per_operation: Mutex<HashMap<String, OperationStats>>,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total spans recorded.
    pub fn total_spans(&self) -> u64 {
        self.total_spans.load(Ordering::Relaxed)
    }

    /// Spans with an error outcome.
    pub fn failed_spans(&self) -> u64 {
        self.failed_spans.load(Ordering::Relaxed)
    }

    /// Sum of all span durations (saturating).
    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed))
    }

    /// Slowest span duration.
    pub fn max_duration(&self) -> Duration {
        Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed))
    }

    /// Statistics for one operation.
    pub fn operation(&self, operation_name: &str) -> Option<OperationStats> {
        self.per_operation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation_name)
            .cloned()
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.total_spans.store(0, Ordering::Relaxed);
        self.failed_spans.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
        self.per_operation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl TelemetrySink for StatsSink {
    fn record(&self, span: &SpanEvent) {
        let nanos = u64::try_from(span.duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_spans.fetch_add(1, Ordering::Relaxed);
        let prev_total = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev_total.checked_add(nanos).is_none() {
            // Saturate instead of wrapping on overflow.
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        if !span.outcome.is_success() {
            self.failed_spans.fetch_add(1, Ordering::Relaxed);
        }
        self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);

        let mut per_operation = self
            .per_operation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stats = per_operation
            .entry(span.operation_name.clone())
            .or_default();
        stats.calls += 1;
        if !span.outcome.is_success() {
            stats.errors += 1;
        }
        stats.total_duration = stats.total_duration.saturating_add(span.duration);
        stats.max_duration = stats.max_duration.max(span.duration);
    }
}

/// A composite sink that delegates to multiple sinks.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[allow(clippy::should_implement_trait)]
    pub fn add<S: TelemetrySink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add an Arc-wrapped sink.
    pub fn add_arc(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for CompositeSink {
    fn record(&self, span: &SpanEvent) {
        for sink in &self.sinks {
            sink.record(span);
        }
    }
}
