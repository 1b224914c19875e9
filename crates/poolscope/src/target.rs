//! Interception points and the bindings that attach interceptors to them.

use crate::interceptor::Interceptor;
use crate::scope::{ExecutionPolicy, ScopeId};
use std::fmt;
use std::sync::Arc;

/// Method name used for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// One interception point: a method (or constructor) of a class, identified by its
/// parameter type descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptionTarget {
    class_name: String,
    method_name: String,
    parameter_types: Vec<String>,
}

impl InterceptionTarget {
    /// A method target.
    pub fn method(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        parameter_types: &[&str],
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// A constructor target.
    pub fn constructor(class_name: impl Into<String>, parameter_types: &[&str]) -> Self {
        Self::method(class_name, CONSTRUCTOR_NAME, parameter_types)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn is_constructor(&self) -> bool {
        self.method_name == CONSTRUCTOR_NAME
    }

    /// Class name without its package, e.g. `DataSourceProxy`.
    pub fn simple_class_name(&self) -> &str {
        self.class_name
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(&self.class_name)
    }

    /// Default span operation name: `SimpleClass.method`.
    pub fn operation_name(&self) -> String {
        format!("{}.{}", self.simple_class_name(), self.method_name)
    }
}

impl fmt::Display for InterceptionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.class_name,
            self.method_name,
            self.parameter_types.join(", ")
        )
    }
}

/// How an interceptor hooks its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptorKind {
    /// Runs before and after a method body.
    BeforeAfter,
    /// Runs around a constructor; `after` sees the constructed instance.
    ConstructorHook,
}

/// Whether a binding depends on per-instance monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingTier {
    /// Always attached when the class loads.
    #[default]
    Baseline,
    /// Attached only when the class passes its capability probe.
    StateTracking,
}

/// Attaches one interceptor to one target under a scope.
#[derive(Clone)]
pub struct InterceptorBinding {
    target: InterceptionTarget,
    kind: InterceptorKind,
    scope: ScopeId,
    policy: ExecutionPolicy,
    tier: BindingTier,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptorBinding {
    /// Bind `interceptor` to `target` in `scope`.
    ///
    /// The kind follows the target: constructors get [`InterceptorKind::ConstructorHook`].
    pub fn new<I: Interceptor + 'static>(
        target: InterceptionTarget,
        scope: ScopeId,
        interceptor: I,
    ) -> Self {
        Self::with_arc(target, scope, Arc::new(interceptor))
    }

    /// Bind a shared interceptor (one instance serving several targets).
    pub fn with_arc(
        target: InterceptionTarget,
        scope: ScopeId,
        interceptor: Arc<dyn Interceptor>,
    ) -> Self {
        let kind = if target.is_constructor() {
            InterceptorKind::ConstructorHook
        } else {
            InterceptorKind::BeforeAfter
        };
        Self {
            target,
            kind,
            scope,
            policy: ExecutionPolicy::default(),
            tier: BindingTier::default(),
            interceptor,
        }
    }

    /// Override the execution policy (default [`ExecutionPolicy::Boundary`]).
    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Mark the binding as depending on monitor state.
    pub fn state_tracking(mut self) -> Self {
        self.tier = BindingTier::StateTracking;
        self
    }

    pub fn target(&self) -> &InterceptionTarget {
        &self.target
    }

    pub fn kind(&self) -> InterceptorKind {
        self.kind
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn execution_policy(&self) -> ExecutionPolicy {
        self.policy
    }

    pub fn tier(&self) -> BindingTier {
        self.tier
    }

    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }
}

impl fmt::Debug for InterceptorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorBinding")
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("policy", &self.policy)
            .field("tier", &self.tier)
            .field("interceptor", &self.interceptor.name())
            .finish()
    }
}
