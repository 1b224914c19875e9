//! Interceptor behaviors and the per-call context they operate on.

use crate::instance::ObjectRef;
use crate::target::InterceptionTarget;
use crate::telemetry::Value;
use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

/// Error returned by an interceptor hook.
///
/// Hook errors never reach the instrumented application; the runtime logs and drops them.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type for interceptor hooks.
pub type HookResult<T = ()> = Result<T, HookError>;

/// Decision returned from [`Interceptor::before`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAction {
    /// Run the rest of the interception (original call, then `after`).
    #[default]
    Continue,
    /// Do not instrument this call; `after` is not invoked for this interceptor.
    Skip,
}

/// Where a call is in its interception lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    NotEntered,
    PreHookRunning,
    OriginalCallRunning,
    PostHookRunning,
    Done,
}

/// Error category reported for failed calls.
///
/// Errors returned by intercepted methods implement this so the runtime can classify
/// them without knowing their type. The default category is the type's short name.
pub trait CallError: fmt::Display {
    fn kind(&self) -> Cow<'static, str> {
        let full = std::any::type_name::<Self>();
        Cow::Borrowed(full.rsplit("::").next().unwrap_or(full))
    }
}

impl CallError for Infallible {}

impl CallError for std::io::Error {
    fn kind(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{:?}", std::io::Error::kind(self)))
    }
}

/// How the original call ended, as seen by `after` hooks.
pub enum CallOutcome<'a> {
    /// The call returned normally.
    Returned(&'a dyn Any),
    /// The call returned an error or panicked.
    Failed { kind: Cow<'static, str>, message: String },
}

impl CallOutcome<'_> {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Returned(_))
    }

    /// Downcast the returned value.
    pub fn returned<T: Any>(&self) -> Option<&T> {
        match self {
            CallOutcome::Returned(value) => value.downcast_ref::<T>(),
            CallOutcome::Failed { .. } => None,
        }
    }
}

impl fmt::Debug for CallOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Returned(_) => f.write_str("Returned(..)"),
            CallOutcome::Failed { kind, message } => f
                .debug_struct("Failed")
                .field("kind", kind)
                .field("message", message)
                .finish(),
        }
    }
}

/// State of one intercepted call, shared by every interceptor attached to it.
pub struct CallContext {
    pub(crate) target: InterceptionTarget,
    pub(crate) instance: Option<ObjectRef>,
    pub(crate) args: Vec<Value>,
    pub(crate) phase: CallPhase,
    pub(crate) operation_name: Option<String>,
    pub(crate) attributes: BTreeMap<String, Value>,
}

impl CallContext {
    pub(crate) fn new(
        target: InterceptionTarget,
        instance: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            target,
            instance,
            args,
            phase: CallPhase::NotEntered,
            operation_name: None,
            attributes: BTreeMap::new(),
        }
    }

    /// The intercepted method.
    pub fn target(&self) -> &InterceptionTarget {
        &self.target
    }

    /// The receiving instance. For constructors this is only set once `after` runs.
    pub fn instance(&self) -> Option<&ObjectRef> {
        self.instance.as_ref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Override the span operation name (default `SimpleClass.method`).
    pub fn set_operation_name(&mut self, name: impl Into<String>) {
        self.operation_name = Some(name.into());
    }

    /// Add an attribute to the span.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub(crate) fn operation_name(&self) -> String {
        self.operation_name
            .clone()
            .unwrap_or_else(|| self.target.operation_name())
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("target", &self.target)
            .field("instance", &self.instance.as_ref().map(|i| i.class_name()))
            .field("args", &self.args)
            .field("phase", &self.phase)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Behavior run around an intercepted method.
///
/// Both hooks run on the calling thread. Returning an error (or panicking) is contained
/// by the runtime: it is logged and the original call proceeds unaffected.
pub trait Interceptor: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Called before the original method body.
    fn before(&self, ctx: &mut CallContext) -> HookResult<HookAction> {
        let _ = ctx;
        Ok(HookAction::Continue)
    }

    /// Called after the original method body, with its outcome.
    fn after(&self, ctx: &mut CallContext, outcome: &CallOutcome<'_>) -> HookResult {
        let _ = (ctx, outcome);
        Ok(())
    }

    /// Whether calls through this interceptor produce a span.
    fn records_span(&self) -> bool {
        true
    }
}
