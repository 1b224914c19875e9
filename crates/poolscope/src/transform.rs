//! Decides, per loading class, which interceptors attach.

use crate::error::{InstrumentError, InstrumentResult};
use crate::instrumentor::{ClassDescriptor, Instrumentor};
use crate::registry::TargetRegistry;
use crate::runtime::DispatchTable;
use crate::target::{BindingTier, InterceptorBinding};
use std::borrow::Cow;
use std::sync::Arc;

/// Result of transforming one class.
#[derive(Debug)]
pub struct TransformOutcome {
    /// Rewritten class bytes.
    pub class_bytes: Vec<u8>,
    /// Bindings that were attached, in registration order.
    pub bindings: Vec<InterceptorBinding>,
    /// Capability probe result, if the class has state-tracking bindings.
    pub capable: Option<bool>,
}

/// Applies registered bindings to classes as they load.
pub struct TransformCoordinator {
    registry: Arc<TargetRegistry>,
    instrumentor: Arc<dyn Instrumentor>,
    dispatch: Arc<DispatchTable>,
}

impl TransformCoordinator {
    pub fn new(
        registry: Arc<TargetRegistry>,
        instrumentor: Arc<dyn Instrumentor>,
        dispatch: Arc<DispatchTable>,
    ) -> Self {
        Self {
            registry,
            instrumentor,
            dispatch,
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Whether any class would be transformed at all.
    pub fn is_inert(&self) -> bool {
        self.registry.is_empty()
    }

    /// Run `class`'s capability probe.
    ///
    /// `None` when the class has no state-tracking bindings, so no probe is needed.
    pub fn probe(&self, class: &ClassDescriptor) -> Option<bool> {
        let bindings = self.registry.resolve(&class.name);
        if !bindings.iter().any(|b| b.tier() == BindingTier::StateTracking) {
            return None;
        }
        Some(
            self.registry
                .probe(&class.name)
                .is_none_or(|probe| probe.check(class)),
        )
    }

    /// The bindings to attach to `class`.
    ///
    /// State-tracking bindings are dropped when the capability probe fails. Every
    /// remaining binding must name a method the class declares.
    pub fn select_bindings(&self, class: &ClassDescriptor) -> InstrumentResult<Vec<InterceptorBinding>> {
        self.select(class, self.probe(class))
    }

    fn select(
        &self,
        class: &ClassDescriptor,
        capable: Option<bool>,
    ) -> InstrumentResult<Vec<InterceptorBinding>> {
        if capable == Some(false) {
            tracing::debug!(
                target: "poolscope.transform",
                class = %class.name,
                "capability probe mismatch; attaching baseline interceptors only"
            );
        }
        let mut selected = Vec::new();
        for binding in self.registry.resolve(&class.name) {
            if binding.tier() == BindingTier::StateTracking && capable == Some(false) {
                continue;
            }
            if class.find_method(binding.target()).is_none() {
                return Err(InstrumentError::MethodNotFound(binding.target().clone()));
            }
            selected.push(binding.clone());
        }
        Ok(selected)
    }

    /// Transform a loading class.
    ///
    /// Returns `Ok(None)` when nothing is registered for it. Bindings are published to
    /// the dispatch table only once every one of them was woven successfully, and they
    /// replace everything an earlier load of the class attached. A failed transform
    /// leaves the class with no dispatch entries.
    pub fn transform(
        &self,
        class_name: &str,
        class_bytes: &[u8],
    ) -> InstrumentResult<Option<TransformOutcome>> {
        if self.registry.resolve(class_name).is_empty() {
            return Ok(None);
        }

        let (class_bytes, bindings, capable) = match self.weave(class_name, class_bytes) {
            Ok(woven) => woven,
            Err(err) => {
                // The class stays unmodified, so nothing may dispatch to a previous version.
                self.dispatch.replace_class(class_name, &[]);
                return Err(err);
            }
        };
        self.dispatch.replace_class(class_name, &bindings);

        tracing::info!(
            target: "poolscope.transform",
            class = class_name,
            bindings = bindings.len(),
            capable = ?capable,
            "class instrumented"
        );
        Ok(Some(TransformOutcome {
            class_bytes,
            bindings,
            capable,
        }))
    }

    fn weave(
        &self,
        class_name: &str,
        class_bytes: &[u8],
    ) -> InstrumentResult<(Vec<u8>, Vec<InterceptorBinding>, Option<bool>)> {
        let class = self.instrumentor.inspect(class_name, class_bytes)?;
        let capable = self.probe(&class);
        let bindings = self.select(&class, capable)?;

        let mut rewritten = class_bytes.to_vec();
        for binding in &bindings {
            self.instrumentor
                .add_interceptor(&class, binding, &mut rewritten)?;
        }
        Ok((rewritten, bindings, capable))
    }

    /// Class-load entry point for the host.
    ///
    /// Never fails: classes with nothing to attach, and classes whose transformation
    /// failed, come back unchanged.
    pub fn on_class_load<'a>(&self, class_name: &str, class_bytes: &'a [u8]) -> Cow<'a, [u8]> {
        match self.transform(class_name, class_bytes) {
            Ok(Some(outcome)) => Cow::Owned(outcome.class_bytes),
            Ok(None) => Cow::Borrowed(class_bytes),
            Err(err) => {
                tracing::warn!(
                    target: "poolscope.transform",
                    class = class_name,
                    error = %err,
                    "transform failed; class left unmodified"
                );
                Cow::Borrowed(class_bytes)
            }
        }
    }
}
