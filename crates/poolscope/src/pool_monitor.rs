//! Agent-wide registry of connection-pool monitors.
//!
//! Plugins register a monitor when they see a pool constructed and unregister it when
//! the pool closes. The agent's collector reads [`PoolSnapshot`]s from here.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Live view of one connection pool.
pub trait ConnectionPoolMonitor: Send + Sync {
    /// JDBC URL (or equivalent) of the pool.
    fn url(&self) -> String;

    /// Connections currently checked out, if readable.
    fn num_active(&self) -> Option<i64>;

    /// Maximum pool size, if readable.
    fn max_active(&self) -> Option<i64>;

    /// Whether the pool has been closed or dropped.
    fn is_closed(&self) -> bool;
}

/// Point-in-time pool usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub url: String,
    pub num_active: Option<i64>,
    pub max_active: Option<i64>,
}

/// Registry of live pool monitors.
#[derive(Default)]
pub struct PoolMonitorRegistry {
    monitors: Mutex<Vec<Arc<dyn ConnectionPoolMonitor>>>,
}

impl PoolMonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a monitor. Registering the same monitor twice is a no-op.
    pub fn register(&self, monitor: Arc<dyn ConnectionPoolMonitor>) -> bool {
        let mut monitors = self.monitors.lock().unwrap_or_else(PoisonError::into_inner);
        if monitors.iter().any(|m| Arc::ptr_eq(m, &monitor)) {
            return false;
        }
        tracing::debug!(target: "poolscope.monitor", url = %monitor.url(), "pool monitor registered");
        monitors.push(monitor);
        true
    }

    /// Unregister a monitor. Returns whether it was registered.
    pub fn unregister(&self, monitor: &Arc<dyn ConnectionPoolMonitor>) -> bool {
        let mut monitors = self.monitors.lock().unwrap_or_else(PoisonError::into_inner);
        let before = monitors.len();
        monitors.retain(|m| !Arc::ptr_eq(m, monitor));
        before != monitors.len()
    }

    /// Snapshots of every open pool. Closed monitors are dropped from the registry.
    pub fn snapshots(&self) -> Vec<PoolSnapshot> {
        let mut monitors = self.monitors.lock().unwrap_or_else(PoisonError::into_inner);
        monitors.retain(|m| !m.is_closed());
        monitors
            .iter()
            .map(|m| PoolSnapshot {
                url: m.url(),
                num_active: m.num_active(),
                max_active: m.max_active(),
            })
            .collect()
    }

    /// Number of registered monitors (open or not yet pruned).
    pub fn len(&self) -> usize {
        self.monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    struct FixedMonitor {
        url: &'static str,
        active: AtomicI64,
        closed: AtomicBool,
    }

    impl FixedMonitor {
        fn new(url: &'static str) -> Arc<Self> {
            Arc::new(Self {
                url,
                active: AtomicI64::new(0),
                closed: AtomicBool::new(false),
            })
        }
    }

    impl ConnectionPoolMonitor for FixedMonitor {
        fn url(&self) -> String {
            self.url.to_string()
        }
        fn num_active(&self) -> Option<i64> {
            Some(self.active.load(Ordering::Relaxed))
        }
        fn max_active(&self) -> Option<i64> {
            Some(8)
        }
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn snapshots_reflect_open_pools() {
        let registry = PoolMonitorRegistry::new();
        let a = FixedMonitor::new("jdbc:a");
        let b = FixedMonitor::new("jdbc:b");
        assert!(registry.register(a.clone()));
        assert!(registry.register(b.clone()));
        a.active.store(3, Ordering::Relaxed);

        let snaps = registry.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].url, "jdbc:a");
        assert_eq!(snaps[0].num_active, Some(3));
        assert_eq!(snaps[0].max_active, Some(8));

        b.closed.store(true, Ordering::Relaxed);
        let snaps = registry.snapshots();
        assert_eq!(snaps.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_is_idempotent_and_unregister_works() {
        let registry = PoolMonitorRegistry::new();
        let a: Arc<dyn ConnectionPoolMonitor> = FixedMonitor::new("jdbc:a");
        assert!(registry.register(a.clone()));
        assert!(!registry.register(a.clone()));
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(&a));
        assert!(!registry.unregister(&a));
        assert!(registry.is_empty());
    }
}
