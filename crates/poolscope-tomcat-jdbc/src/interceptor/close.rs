use super::MonitorStates;
use poolscope::{
    CallContext, ConnectionPoolMonitor, HookAction, HookResult, Interceptor, PoolMonitorRegistry,
};
use std::sync::Arc;

/// Retires the monitor of a `DataSourceProxy` being closed.
pub struct DataSourceCloseInterceptor {
    states: MonitorStates,
    pool_monitors: Arc<PoolMonitorRegistry>,
}

impl DataSourceCloseInterceptor {
    pub fn new(states: MonitorStates, pool_monitors: Arc<PoolMonitorRegistry>) -> Self {
        Self {
            states,
            pool_monitors,
        }
    }
}

impl Interceptor for DataSourceCloseInterceptor {
    fn name(&self) -> &str {
        "DataSourceCloseInterceptor"
    }

    fn before(&self, ctx: &mut CallContext) -> HookResult<HookAction> {
        let Some(monitor) = ctx.instance().and_then(|ds| self.states.detach(ds)) else {
            return Ok(HookAction::Continue);
        };
        monitor.close();
        let monitor: Arc<dyn ConnectionPoolMonitor> = monitor;
        if self.pool_monitors.unregister(&monitor) {
            tracing::debug!(target: "poolscope.tomcat_jdbc", url = %monitor.url(), "pool monitor retired");
        }
        Ok(HookAction::Continue)
    }

    fn records_span(&self) -> bool {
        false
    }
}
