//! Per-instance monitor state, associated weakly with instrumented instances.

use crate::error::{InstrumentError, InstrumentResult};
use crate::instance::{Instrumented, ObjectRef, identity};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

const SHARDS: usize = 16;

struct Slot<S> {
    // Holding the weak reference keeps the allocation (not the value) alive, so the
    // address cannot be reused for another instance while this slot exists.
    instance: Weak<dyn Instrumented>,
    state: Arc<S>,
}

impl<S> Slot<S> {
    fn is_live(&self) -> bool {
        self.instance.strong_count() > 0
    }
}

/// Side table from instrumented instances to their monitor state.
///
/// Entries never keep an instance alive: once the last strong reference is gone the
/// entry reads as absent and is reclaimed by [`purge_dead`](Self::purge_dead) or the next
/// access. The table is sharded by instance address, so calls on different instances
/// rarely share a lock.
pub struct MonitorStateHolder<S> {
    shards: Box<[RwLock<HashMap<usize, Slot<S>>>]>,
}

impl<S> Default for MonitorStateHolder<S> {
    fn default() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }
}

impl<S> MonitorStateHolder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, key: usize) -> &RwLock<HashMap<usize, Slot<S>>> {
        // Low bits of an allocation address are alignment; skip them.
        &self.shards[(key >> 4) % self.shards.len()]
    }

    /// Attach `state` to `instance`.
    ///
    /// Fails with [`InstrumentError::AlreadyAttached`] if the instance already has state;
    /// the existing state is kept.
    pub fn attach(&self, instance: &ObjectRef, state: S) -> InstrumentResult<Arc<S>> {
        let key = identity(instance);
        let mut shard = self.shard(key).write().unwrap_or_else(PoisonError::into_inner);
        if shard.get(&key).is_some_and(Slot::is_live) {
            return Err(InstrumentError::AlreadyAttached {
                class_name: instance.class_name().to_string(),
            });
        }
        let state = Arc::new(state);
        shard.insert(
            key,
            Slot {
                instance: Arc::downgrade(instance),
                state: state.clone(),
            },
        );
        Ok(state)
    }

    /// State attached to `instance`, if any.
    pub fn get(&self, instance: &ObjectRef) -> Option<Arc<S>> {
        let key = identity(instance);
        let shard = self.shard(key).read().unwrap_or_else(PoisonError::into_inner);
        shard
            .get(&key)
            .filter(|slot| slot.is_live())
            .map(|slot| slot.state.clone())
    }

    /// Remove and return the state attached to `instance`.
    pub fn detach(&self, instance: &ObjectRef) -> Option<Arc<S>> {
        let key = identity(instance);
        self.shard(key)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .map(|slot| slot.state)
    }

    /// Drop entries whose instance is gone. Returns how many were removed.
    pub fn purge_dead(&self) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut shard = shard.write().unwrap_or_else(PoisonError::into_inner);
            let before = shard.len();
            shard.retain(|_, slot| slot.is_live());
            removed += before - shard.len();
        }
        if removed > 0 {
            tracing::debug!(target: "poolscope.monitor", removed, "purged dead monitor state");
        }
        removed
    }

    /// Number of entries whose instance is still alive.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .filter(|slot| slot.is_live())
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> fmt::Debug for MonitorStateHolder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorStateHolder")
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Pool;
    impl Instrumented for Pool {
        fn class_name(&self) -> &str {
            "test.Pool"
        }
    }

    #[derive(Debug, Default)]
    struct Counter {
        opened: AtomicU32,
    }

    fn pool() -> ObjectRef {
        Arc::new(Pool)
    }

    #[test]
    fn attach_then_get() {
        let holder = MonitorStateHolder::new();
        let instance = pool();
        assert!(holder.get(&instance).is_none());

        let state = holder.attach(&instance, Counter::default()).unwrap();
        state.opened.fetch_add(1, Ordering::Relaxed);
        let again = holder.get(&instance).unwrap();
        assert_eq!(again.opened.load(Ordering::Relaxed), 1);
        assert_eq!(holder.len(), 1);
    }

    #[test]
    fn second_attach_is_rejected_and_original_preserved() {
        let holder = MonitorStateHolder::new();
        let instance = pool();
        let first = holder.attach(&instance, Counter::default()).unwrap();
        first.opened.store(7, Ordering::Relaxed);

        let err = holder.attach(&instance, Counter::default()).unwrap_err();
        assert!(err.is_already_attached());
        assert!(err.to_string().contains("test.Pool"));

        let current = holder.get(&instance).unwrap();
        assert!(Arc::ptr_eq(&first, &current));
        assert_eq!(current.opened.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn distinct_instances_have_distinct_state() {
        let holder = MonitorStateHolder::new();
        let a = pool();
        let b = pool();
        holder.attach(&a, Counter::default()).unwrap();
        assert!(holder.get(&b).is_none());
        holder.attach(&b, Counter::default()).unwrap();
        assert_eq!(holder.len(), 2);
    }

    #[test]
    fn holder_does_not_extend_instance_lifetime() {
        let holder = MonitorStateHolder::new();
        let instance = pool();
        let weak = Arc::downgrade(&instance);
        holder.attach(&instance, Counter::default()).unwrap();

        drop(instance);
        assert!(weak.upgrade().is_none());
        assert_eq!(holder.len(), 0);
        assert_eq!(holder.purge_dead(), 1);
        assert_eq!(holder.purge_dead(), 0);
    }

    #[test]
    fn detach_removes_state() {
        let holder = MonitorStateHolder::new();
        let instance = pool();
        holder.attach(&instance, Counter::default()).unwrap();
        assert!(holder.detach(&instance).is_some());
        assert!(holder.get(&instance).is_none());
        assert!(holder.detach(&instance).is_none());
        holder.attach(&instance, Counter::default()).unwrap();
    }

    #[test]
    fn concurrent_attach_on_different_instances() {
        let holder = Arc::new(MonitorStateHolder::<Counter>::new());
        let instances: Vec<ObjectRef> = (0..64).map(|_| pool()).collect();
        std::thread::scope(|s| {
            for chunk in instances.chunks(16) {
                let holder = &holder;
                s.spawn(move || {
                    for instance in chunk {
                        let state = holder.attach(instance, Counter::default()).unwrap();
                        state.opened.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        assert_eq!(holder.len(), 64);
        for instance in &instances {
            assert_eq!(holder.get(instance).unwrap().opened.load(Ordering::Relaxed), 1);
        }
    }
}
