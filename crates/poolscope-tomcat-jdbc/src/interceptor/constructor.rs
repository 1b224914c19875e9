use super::MonitorStates;
use crate::monitor::DataSourceMonitor;
use poolscope::{
    CallContext, CallOutcome, HookError, HookResult, InstrumentError, Interceptor,
    PoolMonitorRegistry,
};
use std::sync::Arc;

/// Attaches a [`DataSourceMonitor`] to each constructed `DataSourceProxy` and registers
/// it with the agent's pool monitors.
pub struct DataSourceConstructorInterceptor {
    states: MonitorStates,
    pool_monitors: Arc<PoolMonitorRegistry>,
}

impl DataSourceConstructorInterceptor {
    pub fn new(states: MonitorStates, pool_monitors: Arc<PoolMonitorRegistry>) -> Self {
        Self {
            states,
            pool_monitors,
        }
    }
}

impl Interceptor for DataSourceConstructorInterceptor {
    fn name(&self) -> &str {
        "DataSourceConstructorInterceptor"
    }

    fn after(&self, ctx: &mut CallContext, outcome: &CallOutcome<'_>) -> HookResult {
        if !outcome.is_success() {
            return Ok(());
        }
        let instance = ctx
            .instance()
            .ok_or_else(|| HookError::new("constructed instance not available"))?;

        match self.states.attach(instance, DataSourceMonitor::new(instance)) {
            Ok(monitor) => {
                self.pool_monitors.register(monitor);
                Ok(())
            }
            Err(InstrumentError::AlreadyAttached { class_name }) => {
                tracing::warn!(
                    target: "poolscope.tomcat_jdbc",
                    class = %class_name,
                    "data source already has a monitor; keeping the existing one"
                );
                Ok(())
            }
            Err(e) => Err(HookError::new(e.to_string())),
        }
    }

    fn records_span(&self) -> bool {
        false
    }
}
