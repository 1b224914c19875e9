//! Plugin model.
//!
//! A plugin is declarative wiring: during setup it registers which methods to intercept
//! and under which scope. Plugins are either handed to the
//! [`AgentBuilder`](crate::agent::AgentBuilder) directly or auto-registered with
//! `inventory`:
//!
//! ```ignore
//! fn create() -> Box<dyn poolscope::ProfilerPlugin> {
//!     Box::new(MyPlugin::default())
//! }
//!
//! poolscope::inventory::submit! {
//!     poolscope::PluginRegistration { name: "my-plugin", create }
//! }
//! ```

use crate::config::ProfilerConfig;
use crate::error::InstrumentResult;
use crate::pool_monitor::PoolMonitorRegistry;
use crate::registry::{CapabilityProbe, TargetRegistry};
use crate::target::InterceptorBinding;
use std::sync::Arc;

/// An instrumentation plugin.
pub trait ProfilerPlugin: Send + Sync {
    /// Stable plugin name.
    fn name(&self) -> &str;

    /// Register bindings. Called once, before any instrumented class loads.
    fn setup(&self, ctx: &mut PluginSetupContext<'_>) -> InstrumentResult<()>;
}

/// What a plugin can reach during setup.
pub struct PluginSetupContext<'a> {
    config: &'a ProfilerConfig,
    registry: &'a mut TargetRegistry,
    pool_monitors: &'a Arc<PoolMonitorRegistry>,
}

impl<'a> PluginSetupContext<'a> {
    pub(crate) fn new(
        config: &'a ProfilerConfig,
        registry: &'a mut TargetRegistry,
        pool_monitors: &'a Arc<PoolMonitorRegistry>,
    ) -> Self {
        Self {
            config,
            registry,
            pool_monitors,
        }
    }

    pub fn config(&self) -> &ProfilerConfig {
        self.config
    }

    /// Register a binding (see [`TargetRegistry::register`]).
    pub fn register(&mut self, binding: InterceptorBinding) -> InstrumentResult<()> {
        self.registry.register(binding)
    }

    /// Guard `class_name`'s state-tracking bindings with `probe`.
    pub fn require_capability(&mut self, class_name: impl Into<String>, probe: CapabilityProbe) {
        self.registry.set_probe(class_name, probe);
    }

    /// The agent's pool monitor registry.
    pub fn pool_monitors(&self) -> Arc<PoolMonitorRegistry> {
        self.pool_monitors.clone()
    }
}

/// Registration entry for auto-discovered plugins.
pub struct PluginRegistration {
    /// Plugin name, for logs.
    pub name: &'static str,
    /// Creates the plugin.
    pub create: fn() -> Box<dyn ProfilerPlugin>,
}

inventory::collect!(PluginRegistration);

/// Every plugin registered with `inventory::submit!`.
pub fn registered_plugins() -> impl Iterator<Item = &'static PluginRegistration> {
    inventory::iter::<PluginRegistration>.into_iter()
}
