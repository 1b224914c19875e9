//! Routes instrumented calls through their attached interceptors.

use crate::error::InstrumentError;
use crate::instance::{Instrumented, ObjectRef};
use crate::interceptor::{CallContext, CallError, CallOutcome, CallPhase, HookAction, HookResult};
use crate::scope::{self, ScopeGuard};
use crate::target::{InterceptionTarget, InterceptorBinding};
use crate::telemetry::{NoopSink, SpanEvent, SpanOutcome, TelemetrySink, Value};
use chrono::Utc;
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use uuid::Uuid;

/// Bindings attached to loaded classes, keyed by target.
///
/// Written when a class loads, read on every instrumented call.
#[derive(Debug, Default)]
pub struct DispatchTable {
    attached: RwLock<HashMap<InterceptionTarget, Arc<[InterceptorBinding]>>>,
    populated: AtomicBool,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `bindings`, replacing whatever was attached to the same targets before.
    pub fn attach(&self, bindings: &[InterceptorBinding]) {
        if bindings.is_empty() {
            return;
        }
        let mut attached = self.attached.write().unwrap_or_else(PoisonError::into_inner);
        for (target, group) in group_by_target(bindings) {
            attached.insert(target, group.into());
        }
        self.populated.store(true, Ordering::Release);
    }

    /// Make `bindings` the only ones attached to `class_name`.
    ///
    /// Targets of the class that `bindings` does not mention lose their entries, so a
    /// reload that attaches fewer bindings leaves none of the old ones behind.
    pub fn replace_class(&self, class_name: &str, bindings: &[InterceptorBinding]) {
        let mut attached = self.attached.write().unwrap_or_else(PoisonError::into_inner);
        attached.retain(|target, _| target.class_name() != class_name);
        for (target, group) in group_by_target(bindings) {
            attached.insert(target, group.into());
        }
        self.populated.store(!attached.is_empty(), Ordering::Release);
    }

    /// Bindings attached to `target`.
    pub fn lookup(&self, target: &InterceptionTarget) -> Option<Arc<[InterceptorBinding]>> {
        if !self.populated.load(Ordering::Acquire) {
            return None;
        }
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .cloned()
    }

    /// Number of targets with attached bindings.
    pub fn len(&self) -> usize {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        !self.populated.load(Ordering::Acquire)
    }
}

fn group_by_target(
    bindings: &[InterceptorBinding],
) -> HashMap<InterceptionTarget, Vec<InterceptorBinding>> {
    let mut grouped: HashMap<InterceptionTarget, Vec<InterceptorBinding>> = HashMap::new();
    for binding in bindings {
        grouped
            .entry(binding.target().clone())
            .or_default()
            .push(binding.clone());
    }
    grouped
}

/// Description of one call into an instrumented method.
#[derive(Clone)]
pub struct MethodCall<'a> {
    target: &'a InterceptionTarget,
    instance: Option<ObjectRef>,
    args: Vec<Value>,
}

impl<'a> MethodCall<'a> {
    /// A call to `target` with no receiver (static method or constructor).
    pub fn new(target: &'a InterceptionTarget) -> Self {
        Self {
            target,
            instance: None,
            args: Vec::new(),
        }
    }

    /// Set the receiving instance.
    pub fn on(mut self, instance: ObjectRef) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Append an argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Executes intercepted calls.
///
/// The runtime is a transparent wrapper: it never delays, retries or times out the
/// original call, and every failure of its own is contained.
pub struct InterceptorRuntime {
    dispatch: Arc<DispatchTable>,
    sink: Arc<dyn TelemetrySink>,
}

impl InterceptorRuntime {
    pub fn new(dispatch: Arc<DispatchTable>) -> Self {
        Self {
            dispatch,
            sink: Arc::new(NoopSink),
        }
    }

    /// Set the telemetry sink.
    pub fn with_sink<S: TelemetrySink + 'static>(self, sink: S) -> Self {
        self.with_sink_arc(Arc::new(sink))
    }

    /// Set the telemetry sink from an Arc.
    pub fn with_sink_arc(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn dispatch_table(&self) -> &Arc<DispatchTable> {
        &self.dispatch
    }

    /// Run `original` through the interceptors attached to `call`'s target.
    ///
    /// The original's result, including its error, is returned unchanged. If the
    /// original panics, `after` hooks see a failed outcome of kind `panic`, the span is
    /// recorded, and the panic then resumes.
    pub fn invoke<T, E, F>(&self, call: MethodCall<'_>, original: F) -> Result<T, E>
    where
        T: Any,
        E: CallError,
        F: FnOnce() -> Result<T, E>,
    {
        self.dispatch_call(call, original, |_, _| {})
    }

    /// Run constructor `ctor` through its interceptors.
    ///
    /// `after` hooks see the constructed instance via [`CallContext::instance`].
    pub fn construct<T, E, F>(&self, call: MethodCall<'_>, ctor: F) -> Result<Arc<T>, E>
    where
        T: Instrumented,
        E: CallError,
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        self.dispatch_call(call, ctor, |created: &Arc<T>, ctx| {
            let instance: ObjectRef = created.clone();
            ctx.instance = Some(instance);
        })
    }

    fn dispatch_call<T, E, F, R>(
        &self,
        call: MethodCall<'_>,
        original: F,
        on_return: R,
    ) -> Result<T, E>
    where
        T: Any,
        E: CallError,
        F: FnOnce() -> Result<T, E>,
        R: FnOnce(&T, &mut CallContext),
    {
        let Some(bindings) = self.dispatch.lookup(call.target) else {
            return original();
        };

        let mut ctx = CallContext::new(call.target.clone(), call.instance, call.args);
        ctx.phase = CallPhase::PreHookRunning;

        // Guards stay alive until the post hooks finish, so nested calls made by the
        // original body see the scope as active.
        let mut active: Vec<(&InterceptorBinding, ScopeGuard)> = Vec::with_capacity(bindings.len());
        for binding in bindings.iter() {
            let Some(guard) = scope::acquire(binding.scope(), binding.execution_policy()) else {
                tracing::trace!(
                    target: "poolscope.runtime",
                    interceptor = binding.interceptor().name(),
                    scope = %binding.scope(),
                    "suppressed by scope"
                );
                continue;
            };
            let action = run_hook(binding, "before", || binding.interceptor().before(&mut ctx))
                .unwrap_or_default();
            if action == HookAction::Continue {
                active.push((binding, guard));
            }
        }

        if active.is_empty() {
            ctx.phase = CallPhase::Done;
            return original();
        }

        let start = Utc::now();
        let started = Instant::now();
        ctx.phase = CallPhase::OriginalCallRunning;
        let result = catch_unwind(AssertUnwindSafe(original));
        let duration = started.elapsed();
        let end = Utc::now();
        ctx.phase = CallPhase::PostHookRunning;

        let span_outcome = {
            let outcome = match &result {
                Ok(Ok(value)) => {
                    on_return(value, &mut ctx);
                    CallOutcome::Returned(value as &dyn Any)
                }
                Ok(Err(err)) => CallOutcome::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                },
                Err(payload) => CallOutcome::Failed {
                    kind: Cow::Borrowed("panic"),
                    message: panic_message(payload.as_ref()),
                },
            };
            for (binding, _) in active.iter().rev() {
                let _ = run_hook(binding, "after", || binding.interceptor().after(&mut ctx, &outcome));
            }
            match outcome {
                CallOutcome::Returned(_) => SpanOutcome::Success,
                CallOutcome::Failed { kind, message } => SpanOutcome::error(kind, message),
            }
        };

        let records_span = active.iter().any(|(b, _)| b.interceptor().records_span());
        // Release scopes innermost first.
        while let Some((_, guard)) = active.pop() {
            drop(guard);
        }
        ctx.phase = CallPhase::Done;

        if records_span {
            let span = SpanEvent {
                span_id: Uuid::new_v4(),
                operation_name: ctx.operation_name(),
                start,
                end,
                duration,
                outcome: span_outcome,
                attributes: std::mem::take(&mut ctx.attributes),
            };
            let sink = &self.sink;
            if catch_unwind(AssertUnwindSafe(|| sink.record(&span))).is_err() {
                tracing::warn!(
                    target: "poolscope.runtime",
                    operation = %span.operation_name,
                    "telemetry sink panicked; span dropped"
                );
            }
        }

        match result {
            Ok(result) => result,
            Err(payload) => resume_unwind(payload),
        }
    }
}

/// Run one hook inside the fail-open boundary.
///
/// Errors and panics are logged and turned into `None`.
fn run_hook<T>(
    binding: &InterceptorBinding,
    phase: &'static str,
    hook: impl FnOnce() -> HookResult<T>,
) -> Option<T> {
    let message = match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    let failure = InstrumentError::HookFailure {
        interceptor: binding.interceptor().name().to_string(),
        phase,
        target: binding.target().clone(),
        message,
    };
    tracing::warn!(target: "poolscope.runtime", error = %failure, "interceptor hook failed");
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
