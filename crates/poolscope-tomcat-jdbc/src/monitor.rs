use crate::constants::{GET_MAX_ACTIVE, GET_NUM_ACTIVE, GET_URL};
use poolscope::{ConnectionPoolMonitor, Instrumented, ObjectRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Pool monitor backed by a live `DataSourceProxy`.
///
/// Holds the data source weakly; a dropped data source reads as closed.
pub struct DataSourceMonitor {
    data_source: Weak<dyn Instrumented>,
    closed: AtomicBool,
}

impl DataSourceMonitor {
    pub fn new(data_source: &ObjectRef) -> Self {
        Self {
            data_source: Arc::downgrade(data_source),
            closed: AtomicBool::new(false),
        }
    }

    /// Mark the pool closed. Subsequent snapshots skip it.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn read_i64(&self, accessor: &str) -> Option<i64> {
        self.data_source
            .upgrade()?
            .read_property(accessor)?
            .as_i64()
    }
}

impl ConnectionPoolMonitor for DataSourceMonitor {
    fn url(&self) -> String {
        self.data_source
            .upgrade()
            .and_then(|ds| ds.read_property(GET_URL))
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    fn num_active(&self) -> Option<i64> {
        self.read_i64(GET_NUM_ACTIVE)
    }

    fn max_active(&self) -> Option<i64> {
        self.read_i64(GET_MAX_ACTIVE)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.data_source.strong_count() == 0
    }
}

impl std::fmt::Debug for DataSourceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceMonitor")
            .field("url", &self.url())
            .field("closed", &self.is_closed())
            .finish()
    }
}
