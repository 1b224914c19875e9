//! # poolscope
//!
//! A method-interception core for application-performance-monitoring agents.
//!
//! ## Features
//!
//! - **Declarative plugins**: plugins register interception points; they never touch class bytes
//! - **Capability probes**: state-tracking interceptors attach only to classes that expose the accessors they read
//! - **Scoped interception**: nested calls within one logical operation are reported once
//! - **Fail-open hooks**: interceptor errors and panics are logged, never surfaced to the application
//! - **Weak monitor state**: per-instance state that never keeps an instance alive
//! - **Pluggable telemetry**: spans go to any [`TelemetrySink`]
//!
//! ## Example
//!
//! ```ignore
//! use poolscope::prelude::*;
//!
//! let agent = Agent::builder()
//!     .config(ProfilerConfig::new().with_bool("profiler.jdbc.tomcatjdbc", true))
//!     .instrumentor(host_instrumentor)
//!     .sink(TracingSink::new())
//!     .discover_plugins()
//!     .build()?;
//!
//! // From the host's class-load hook:
//! let bytes = agent.on_class_load(class_name, &class_bytes);
//!
//! // From instrumented code:
//! let conn = agent.runtime().invoke(MethodCall::new(&GET_CONNECTION).on(pool), || pool.get_connection())?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod instance;
pub mod instrumentor;
pub mod interceptor;
pub mod monitor_state;
pub mod plugin;
pub mod pool_monitor;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod scope;
pub mod target;
pub mod telemetry;
pub mod transform;

pub use agent::{Agent, AgentBuilder};
pub use config::ProfilerConfig;
pub use error::{InstrumentError, InstrumentResult};
pub use instance::{Instrumented, ObjectRef};
pub use instrumentor::{ClassDescriptor, Instrumentor, MethodDescriptor, StaticInstrumentor};
pub use interceptor::{
    CallContext, CallError, CallOutcome, CallPhase, HookAction, HookError, HookResult, Interceptor,
};
pub use monitor_state::MonitorStateHolder;
pub use plugin::{PluginRegistration, PluginSetupContext, ProfilerPlugin, registered_plugins};
pub use pool_monitor::{ConnectionPoolMonitor, PoolMonitorRegistry, PoolSnapshot};
pub use registry::{CapabilityProbe, TargetRegistry};
pub use runtime::{DispatchTable, InterceptorRuntime, MethodCall};
pub use scope::{ExecutionPolicy, ScopeGuard, ScopeId};
pub use target::{BindingTier, InterceptionTarget, InterceptorBinding, InterceptorKind};
pub use telemetry::{SpanEvent, SpanOutcome, TelemetrySink, Value};
pub use transform::{TransformCoordinator, TransformOutcome};

// Re-export inventory for plugin registration
pub use inventory;
