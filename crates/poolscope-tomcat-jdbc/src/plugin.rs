use crate::config::TomcatJdbcConfig;
use crate::constants::{DATA_SOURCE_PROXY, MONITOR_ACCESSORS, SCOPE};
use crate::interceptor::{
    DataSourceCloseConnectionInterceptor, DataSourceCloseInterceptor,
    DataSourceConstructorInterceptor, DataSourceGetConnectionInterceptor, MonitorStates,
};
use crate::targets;
use poolscope::{
    CapabilityProbe, InstrumentResult, Interceptor, InterceptorBinding, PluginRegistration,
    PluginSetupContext, ProfilerPlugin,
};
use std::sync::Arc;

/// Plugin name, as used in logs and the `inventory` registration.
pub const PLUGIN_NAME: &str = "tomcat-jdbc";

/// Instruments Tomcat JDBC's `DataSourceProxy` (and optionally `ConnectionPool`).
///
/// Every `DataSourceProxy` gets connection-acquisition tracing. Classes that also expose
/// `getUrl`, `getNumActive` and `getMaxActive` get a pool monitor from construction until
/// `close`.
#[derive(Debug, Default)]
pub struct TomcatJdbcPlugin {
    states: MonitorStates,
}

impl TomcatJdbcPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monitor state attached to live data sources.
    pub fn monitor_states(&self) -> MonitorStates {
        self.states.clone()
    }
}

impl ProfilerPlugin for TomcatJdbcPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, ctx: &mut PluginSetupContext<'_>) -> InstrumentResult<()> {
        let config = TomcatJdbcConfig::from_profiler_config(ctx.config());
        if !config.plugin_enable {
            tracing::info!(target: "poolscope.tomcat_jdbc", %config, "plugin disabled");
            return Ok(());
        }
        tracing::info!(target: "poolscope.tomcat_jdbc", %config, "plugin setup");

        let pool_monitors = ctx.pool_monitors();
        ctx.require_capability(DATA_SOURCE_PROXY, CapabilityProbe::new(MONITOR_ACCESSORS));

        ctx.register(
            InterceptorBinding::new(
                targets::data_source_close(),
                SCOPE,
                DataSourceCloseInterceptor::new(self.states.clone(), pool_monitors.clone()),
            )
            .state_tracking(),
        )?;
        ctx.register(
            InterceptorBinding::new(
                targets::data_source_constructor(),
                SCOPE,
                DataSourceConstructorInterceptor::new(self.states.clone(), pool_monitors),
            )
            .state_tracking(),
        )?;

        let get_connection: Arc<dyn Interceptor> =
            Arc::new(DataSourceGetConnectionInterceptor::new(self.states.clone()));
        ctx.register(InterceptorBinding::with_arc(
            targets::get_connection(),
            SCOPE,
            get_connection.clone(),
        ))?;
        ctx.register(InterceptorBinding::with_arc(
            targets::get_connection_with_credentials(),
            SCOPE,
            get_connection,
        ))?;

        if config.profile_close {
            ctx.register(InterceptorBinding::new(
                targets::connection_pool_close(),
                SCOPE,
                DataSourceCloseConnectionInterceptor,
            ))?;
        }
        Ok(())
    }
}

fn create() -> Box<dyn ProfilerPlugin> {
    Box::new(TomcatJdbcPlugin::new())
}

poolscope::inventory::submit! {
    PluginRegistration { name: PLUGIN_NAME, create }
}
