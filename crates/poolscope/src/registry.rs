//! Declarative interception specs collected during plugin setup.

use crate::error::{InstrumentError, InstrumentResult};
use crate::instrumentor::{ClassDescriptor, MethodDescriptor};
use crate::target::{InterceptionTarget, InterceptorBinding};
use std::collections::{HashMap, HashSet};

/// Method signatures a class must declare before state-tracking bindings may attach to
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityProbe {
    required_methods: Vec<MethodDescriptor>,
}

impl CapabilityProbe {
    /// Require each named method with no parameters (the accessor form).
    pub fn new<I, S>(required_methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_methods: required_methods
                .into_iter()
                .map(|name| MethodDescriptor {
                    name: name.into(),
                    parameter_types: Vec::new(),
                })
                .collect(),
        }
    }

    /// Also require `name(parameter_types)`.
    pub fn with_method(mut self, name: impl Into<String>, parameter_types: &[&str]) -> Self {
        self.required_methods.push(MethodDescriptor {
            name: name.into(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn required_methods(&self) -> &[MethodDescriptor] {
        &self.required_methods
    }

    /// Whether `class` declares every required signature exactly.
    pub fn check(&self, class: &ClassDescriptor) -> bool {
        self.required_methods.iter().all(|m| class.declares(m))
    }
}

/// Maps class names to the bindings registered for them.
///
/// Built during setup, which is single-threaded; the agent then shares it immutably, so
/// lookups from concurrent class-load events need no locking.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    by_class: HashMap<String, Vec<InterceptorBinding>>,
    probes: HashMap<String, CapabilityProbe>,
    pass: String,
    bound_in_pass: HashSet<InterceptionTarget>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a setup pass for `plugin`. Duplicate detection is scoped to one pass, so two
    /// plugins may bind the same target.
    pub fn begin_pass(&mut self, plugin: impl Into<String>) {
        self.pass = plugin.into();
        self.bound_in_pass.clear();
    }

    /// Name of the plugin whose pass is running.
    pub fn current_pass(&self) -> &str {
        &self.pass
    }

    /// Register a binding.
    ///
    /// Fails with [`InstrumentError::DuplicateBinding`] if the binding's target is already
    /// bound in the current pass; the registry is left unchanged in that case.
    pub fn register(&mut self, binding: InterceptorBinding) -> InstrumentResult<()> {
        if !self.bound_in_pass.insert(binding.target().clone()) {
            return Err(InstrumentError::DuplicateBinding {
                target: binding.target().clone(),
                plugin: self.pass.clone(),
            });
        }
        tracing::debug!(
            target: "poolscope.registry",
            plugin = %self.pass,
            target_method = %binding.target(),
            interceptor = binding.interceptor().name(),
            scope = %binding.scope(),
            "registered binding"
        );
        self.by_class
            .entry(binding.target().class_name().to_string())
            .or_default()
            .push(binding);
        Ok(())
    }

    /// Bindings registered for `class_name`, in registration order.
    pub fn resolve(&self, class_name: &str) -> &[InterceptorBinding] {
        self.by_class
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Install the capability probe guarding `class_name`'s state-tracking bindings.
    pub fn set_probe(&mut self, class_name: impl Into<String>, probe: CapabilityProbe) {
        self.probes.insert(class_name.into(), probe);
    }

    pub fn probe(&self, class_name: &str) -> Option<&CapabilityProbe> {
        self.probes.get(class_name)
    }

    /// Classes with at least one binding.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.by_class.keys().map(String::as_str)
    }

    /// Total number of bindings.
    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::Interceptor;
    use crate::scope::ScopeId;

    const SCOPE: ScopeId = ScopeId::new("REGISTRY_TEST_SCOPE");

    struct Named(&'static str);
    impl Interceptor for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn binding(class: &str, method: &str, params: &[&str]) -> InterceptorBinding {
        InterceptorBinding::new(
            InterceptionTarget::method(class, method, params),
            SCOPE,
            Named("named"),
        )
    }

    #[test]
    fn resolve_returns_bindings_in_registration_order() {
        let mut registry = TargetRegistry::new();
        registry.begin_pass("test");
        registry.register(binding("a.Pool", "close", &["boolean"])).unwrap();
        registry.register(binding("a.Pool", "getConnection", &[])).unwrap();
        registry.register(binding("b.Other", "run", &[])).unwrap();
        registry
            .register(binding("a.Pool", "getConnection", &["java.lang.String"]))
            .unwrap();

        let methods = |r: &TargetRegistry| -> Vec<String> {
            r.resolve("a.Pool")
                .iter()
                .map(|b| b.target().to_string())
                .collect()
        };
        let first = methods(&registry);
        assert_eq!(
            first,
            vec![
                "a.Pool.close(boolean)",
                "a.Pool.getConnection()",
                "a.Pool.getConnection(java.lang.String)",
            ]
        );
        assert_eq!(methods(&registry), first);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn resolve_unknown_class_is_empty() {
        let registry = TargetRegistry::new();
        assert!(registry.resolve("nope").is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_in_same_pass_is_rejected() {
        let mut registry = TargetRegistry::new();
        registry.begin_pass("tomcat-jdbc");
        registry.register(binding("a.Pool", "close", &["boolean"])).unwrap();
        let err = registry
            .register(binding("a.Pool", "close", &["boolean"]))
            .unwrap_err();
        assert!(err.is_duplicate_binding());
        assert!(err.to_string().contains("tomcat-jdbc"));
        assert_eq!(registry.resolve("a.Pool").len(), 1);
    }

    #[test]
    fn same_target_allowed_across_passes() {
        let mut registry = TargetRegistry::new();
        registry.begin_pass("first");
        registry.register(binding("a.Pool", "close", &["boolean"])).unwrap();
        registry.begin_pass("second");
        registry.register(binding("a.Pool", "close", &["boolean"])).unwrap();
        assert_eq!(registry.resolve("a.Pool").len(), 2);
        assert_eq!(registry.current_pass(), "second");
    }

    #[test]
    fn probe_checks_every_required_method() {
        let probe = CapabilityProbe::new(["getUrl", "getNumActive", "getMaxActive"]);
        let full = ClassDescriptor::new("a.Pool")
            .method("getUrl", &[])
            .method("getNumActive", &[])
            .method("getMaxActive", &[]);
        assert!(probe.check(&full));

        for missing in ["getUrl", "getNumActive", "getMaxActive"] {
            let mut class = ClassDescriptor::new("a.Pool");
            for m in probe.required_methods() {
                if m.name != missing {
                    class = class.method(m.name.clone(), &[]);
                }
            }
            assert!(!probe.check(&class), "probe should fail without {missing}");
        }

        let overloads_only = ClassDescriptor::new("a.Pool")
            .method("getUrl", &["java.lang.String"])
            .method("getNumActive", &["int"])
            .method("getMaxActive", &["int"]);
        assert!(!probe.check(&overloads_only));

        let mixed = full.clone().method("getUrl", &["java.lang.String"]);
        assert!(probe.check(&mixed));
    }

    #[test]
    fn probe_with_parameterised_signature() {
        let probe = CapabilityProbe::new(["getUrl"]).with_method("setMaxActive", &["int"]);
        let base = ClassDescriptor::new("a.Pool").method("getUrl", &[]);
        assert!(!probe.check(&base));
        assert!(!probe.check(&base.clone().method("setMaxActive", &["long"])));
        assert!(probe.check(&base.method("setMaxActive", &["int"])));
    }
}
