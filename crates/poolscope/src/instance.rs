use crate::telemetry::Value;
use std::any::Any;
use std::sync::Arc;

/// An object whose methods can be intercepted.
///
/// Instrumented instances are shared as [`ObjectRef`]s; the runtime identifies them by
/// allocation address and only ever keeps weak references to them.
pub trait Instrumented: Any + Send + Sync {
    /// Fully qualified class name of the instance.
    fn class_name(&self) -> &str;

    /// Read a monitoring accessor such as `getNumActive`.
    ///
    /// Returns `None` when the accessor is not exposed. Only accessors confirmed by the
    /// class's capability probe should be relied upon.
    fn read_property(&self, accessor: &str) -> Option<Value> {
        let _ = accessor;
        None
    }
}

/// Shared handle to an instrumented instance.
pub type ObjectRef = Arc<dyn Instrumented>;

/// Identity of an instance: its allocation address.
pub(crate) fn identity(instance: &ObjectRef) -> usize {
    Arc::as_ptr(instance) as *const () as usize
}
