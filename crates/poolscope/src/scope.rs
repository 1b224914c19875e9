//! Thread-local reentrancy tracking.
//!
//! Interceptors that belong to the same logical operation (for example every interceptor
//! of a JDBC pool plugin) share a [`ScopeId`]. While one of them runs, nested entries
//! into the same scope on that thread are detected so their duplicate telemetry can be
//! suppressed.

use crate::error::{InstrumentError, InstrumentResult};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

/// Identifies a group of related interceptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(&'static str);

impl ScopeId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// When an interceptor runs relative to its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Only when this call is the outermost entry into the scope.
    #[default]
    Boundary,
    /// Whether or not the scope is already active.
    Always,
    /// Only when nested inside an active scope.
    Internal,
}

thread_local! {
    static ACTIVE_SCOPES: RefCell<Vec<ScopeId>> = const { RefCell::new(Vec::new()) };
}

/// Whether `scope` is active on the current thread.
pub fn is_active(scope: ScopeId) -> bool {
    ACTIVE_SCOPES.with(|active| active.borrow().contains(&scope))
}

/// Enter `scope` on the current thread.
///
/// Returns `true` if this is the outermost entry, in which case the caller must call
/// [`exit`] exactly once. Returns `false` when already inside the scope; nothing changes
/// and no `exit` is owed.
pub fn enter(scope: ScopeId) -> bool {
    ACTIVE_SCOPES.with(|active| {
        let mut active = active.borrow_mut();
        if active.contains(&scope) {
            false
        } else {
            active.push(scope);
            true
        }
    })
}

/// Leave `scope` after an outermost [`enter`].
///
/// Exiting a scope that is not active is a programming error: it is reported and the
/// thread's scope state is left untouched.
pub fn exit(scope: ScopeId) -> InstrumentResult<()> {
    let removed = ACTIVE_SCOPES.with(|active| {
        let mut active = active.borrow_mut();
        match active.iter().rposition(|s| *s == scope) {
            Some(pos) => {
                active.remove(pos);
                true
            }
            None => false,
        }
    });
    if removed {
        Ok(())
    } else {
        tracing::error!(target: "poolscope.scope", scope = %scope, "scope exit without matching enter");
        Err(InstrumentError::UnbalancedScopeExit(scope))
    }
}

/// Acquire `scope` according to `policy`.
///
/// Returns `None` when the policy says the interceptor must not run. The returned guard
/// releases the scope on drop (including while unwinding) if this acquisition was the
/// outermost entry.
pub fn acquire(scope: ScopeId, policy: ExecutionPolicy) -> Option<ScopeGuard> {
    let nested = is_active(scope);
    match (policy, nested) {
        (ExecutionPolicy::Boundary, true) | (ExecutionPolicy::Internal, false) => None,
        (ExecutionPolicy::Internal, true) | (ExecutionPolicy::Always, true) => {
            Some(ScopeGuard::new(scope, false))
        }
        (ExecutionPolicy::Boundary, false) | (ExecutionPolicy::Always, false) => {
            let owns = enter(scope);
            Some(ScopeGuard::new(scope, owns))
        }
    }
}

/// RAII handle for an acquired scope. Not `Send`: scope state belongs to one thread.
#[must_use = "the scope is released as soon as the guard is dropped"]
pub struct ScopeGuard {
    scope: ScopeId,
    owns: bool,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    fn new(scope: ScopeId, owns: bool) -> Self {
        Self {
            scope,
            owns,
            _not_send: PhantomData,
        }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Whether this guard performed the outermost entry.
    pub fn is_outermost(&self) -> bool {
        self.owns
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.owns {
            let _ = exit(self.scope);
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("scope", &self.scope)
            .field("outermost", &self.owns)
            .finish()
    }
}
