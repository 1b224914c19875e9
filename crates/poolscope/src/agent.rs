//! Top-level entry points for the host.

use crate::config::ProfilerConfig;
use crate::error::InstrumentResult;
use crate::instrumentor::{Instrumentor, StaticInstrumentor};
use crate::plugin::{PluginSetupContext, ProfilerPlugin, registered_plugins};
use crate::pool_monitor::PoolMonitorRegistry;
use crate::registry::TargetRegistry;
use crate::runtime::{DispatchTable, InterceptorRuntime};
use crate::telemetry::{NoopSink, TelemetrySink};
use crate::transform::TransformCoordinator;
use std::borrow::Cow;
use std::sync::Arc;

/// Builds an [`Agent`] by running every plugin's setup.
pub struct AgentBuilder {
    config: ProfilerConfig,
    instrumentor: Arc<dyn Instrumentor>,
    sink: Arc<dyn TelemetrySink>,
    plugins: Vec<Box<dyn ProfilerPlugin>>,
    discover: bool,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self {
            config: ProfilerConfig::default(),
            instrumentor: Arc::new(StaticInstrumentor::new()),
            sink: Arc::new(NoopSink),
            plugins: Vec::new(),
            discover: false,
        }
    }
}

impl AgentBuilder {
    /// Set the profiler configuration.
    pub fn config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the host instrumentor.
    pub fn instrumentor<I: Instrumentor + 'static>(self, instrumentor: I) -> Self {
        self.instrumentor_arc(Arc::new(instrumentor))
    }

    /// Set the host instrumentor from an Arc.
    pub fn instrumentor_arc(mut self, instrumentor: Arc<dyn Instrumentor>) -> Self {
        self.instrumentor = instrumentor;
        self
    }

    /// Set the telemetry sink.
    pub fn sink<S: TelemetrySink + 'static>(self, sink: S) -> Self {
        self.sink_arc(Arc::new(sink))
    }

    /// Set the telemetry sink from an Arc.
    pub fn sink_arc(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Add a plugin.
    pub fn plugin<P: ProfilerPlugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Also set up every plugin registered through `inventory`.
    pub fn discover_plugins(mut self) -> Self {
        self.discover = true;
        self
    }

    /// Run plugin setup.
    ///
    /// Setup errors (such as a duplicate binding) abort the build; the host keeps running
    /// uninstrumented.
    pub fn build(self) -> InstrumentResult<Agent> {
        let mut plugins = self.plugins;
        if self.discover {
            for registration in registered_plugins() {
                tracing::debug!(target: "poolscope.plugin", plugin = registration.name, "discovered plugin");
                plugins.push((registration.create)());
            }
        }

        let pool_monitors = Arc::new(PoolMonitorRegistry::new());
        let mut registry = TargetRegistry::new();
        for plugin in &plugins {
            registry.begin_pass(plugin.name());
            let mut ctx = PluginSetupContext::new(&self.config, &mut registry, &pool_monitors);
            plugin.setup(&mut ctx)?;
        }
        tracing::info!(
            target: "poolscope.plugin",
            plugins = plugins.len(),
            bindings = registry.len(),
            "agent setup complete"
        );

        let dispatch = Arc::new(DispatchTable::new());
        let coordinator =
            TransformCoordinator::new(Arc::new(registry), self.instrumentor, dispatch.clone());
        let runtime = InterceptorRuntime::new(dispatch).with_sink_arc(self.sink);
        Ok(Agent {
            coordinator,
            runtime: Arc::new(runtime),
            pool_monitors,
        })
    }
}

/// A configured instrumentation agent.
pub struct Agent {
    coordinator: TransformCoordinator,
    runtime: Arc<InterceptorRuntime>,
    pool_monitors: Arc<PoolMonitorRegistry>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Class-load hook: returns the (possibly rewritten) class bytes.
    pub fn on_class_load<'a>(&self, class_name: &str, class_bytes: &'a [u8]) -> Cow<'a, [u8]> {
        self.coordinator.on_class_load(class_name, class_bytes)
    }

    pub fn coordinator(&self) -> &TransformCoordinator {
        &self.coordinator
    }

    /// Runtime shared with instrumented code.
    pub fn runtime(&self) -> &Arc<InterceptorRuntime> {
        &self.runtime
    }

    pub fn pool_monitors(&self) -> &Arc<PoolMonitorRegistry> {
        &self.pool_monitors
    }
}
