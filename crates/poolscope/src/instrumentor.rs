//! The host's class-rewriting capability.
//!
//! poolscope never parses or rewrites class bytes itself. The host supplies an
//! [`Instrumentor`] that describes a loading class and weaves interceptor calls into it.

use crate::error::{InstrumentError, InstrumentResult};
use crate::target::{CONSTRUCTOR_NAME, InterceptionTarget, InterceptorBinding};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// A declared method of a loading class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameter_types: Vec<String>,
}

/// What the instrumentor reports about a loading class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Declare a method.
    pub fn method(mut self, name: impl Into<String>, parameter_types: &[&str]) -> Self {
        self.methods.push(MethodDescriptor {
            name: name.into(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    /// Declare a constructor.
    pub fn constructor(self, parameter_types: &[&str]) -> Self {
        self.method(CONSTRUCTOR_NAME, parameter_types)
    }

    /// Whether `method` is declared with exactly its parameter types.
    pub fn declares(&self, method: &MethodDescriptor) -> bool {
        self.methods.contains(method)
    }

    /// Find the method matching `target`'s name and parameter types exactly.
    pub fn find_method(&self, target: &InterceptionTarget) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == target.method_name() && m.parameter_types == target.parameter_types())
    }
}

/// Injected class-rewriting capability.
pub trait Instrumentor: Send + Sync {
    /// Describe the class being loaded.
    fn inspect(&self, class_name: &str, class_bytes: &[u8]) -> InstrumentResult<ClassDescriptor>;

    /// Weave `binding`'s interceptor into `class_bytes`.
    fn add_interceptor(
        &self,
        class: &ClassDescriptor,
        binding: &InterceptorBinding,
        class_bytes: &mut Vec<u8>,
    ) -> InstrumentResult<()>;
}

/// An instrumentor backed by a table of known class descriptors.
///
/// It leaves class bytes untouched: interception happens through the runtime's dispatch
/// table, with instrumented code calling
/// [`InterceptorRuntime::invoke`](crate::runtime::InterceptorRuntime::invoke) itself.
#[derive(Debug, Default)]
pub struct StaticInstrumentor {
    classes: RwLock<HashMap<String, ClassDescriptor>>,
}

impl StaticInstrumentor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `class` known to the instrumentor.
    pub fn define(&self, class: ClassDescriptor) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class.name.clone(), class);
    }

    /// Builder-style [`define`](Self::define).
    pub fn with_class(self, class: ClassDescriptor) -> Self {
        self.define(class);
        self
    }
}

impl Instrumentor for StaticInstrumentor {
    fn inspect(&self, class_name: &str, _class_bytes: &[u8]) -> InstrumentResult<ClassDescriptor> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class_name)
            .cloned()
            .ok_or_else(|| InstrumentError::instrumentor(format!("unknown class {class_name}")))
    }

    fn add_interceptor(
        &self,
        class: &ClassDescriptor,
        binding: &InterceptorBinding,
        _class_bytes: &mut Vec<u8>,
    ) -> InstrumentResult<()> {
        tracing::trace!(
            target: "poolscope.transform",
            class = %class.name,
            target_method = %binding.target(),
            "interceptor routed through dispatch table"
        );
        Ok(())
    }
}
