//! Common imports for plugins and hosts.

pub use crate::agent::{Agent, AgentBuilder};
pub use crate::config::ProfilerConfig;
pub use crate::error::{InstrumentError, InstrumentResult};
pub use crate::instance::{Instrumented, ObjectRef};
pub use crate::instrumentor::{ClassDescriptor, Instrumentor, StaticInstrumentor};
pub use crate::interceptor::{
    CallContext, CallError, CallOutcome, HookAction, HookError, HookResult, Interceptor,
};
pub use crate::monitor_state::MonitorStateHolder;
pub use crate::plugin::{PluginRegistration, PluginSetupContext, ProfilerPlugin};
pub use crate::pool_monitor::{ConnectionPoolMonitor, PoolMonitorRegistry};
pub use crate::registry::CapabilityProbe;
pub use crate::runtime::{InterceptorRuntime, MethodCall};
pub use crate::scope::{ExecutionPolicy, ScopeId};
pub use crate::target::{InterceptionTarget, InterceptorBinding};
pub use crate::telemetry::{CollectingSink, TracingSink, Value};
