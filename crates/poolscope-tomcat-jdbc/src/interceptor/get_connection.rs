use super::{MonitorStates, attr};
use crate::constants::SERVICE_TYPE;
use poolscope::{
    CallContext, CallOutcome, ConnectionPoolMonitor, HookAction, HookResult, Interceptor,
};

/// Traces connection acquisition through `DataSourceProxy.getConnection`.
///
/// Works on any `DataSourceProxy`; pool usage is added to the span only when the data
/// source carries a monitor.
pub struct DataSourceGetConnectionInterceptor {
    states: MonitorStates,
}

impl DataSourceGetConnectionInterceptor {
    pub fn new(states: MonitorStates) -> Self {
        Self { states }
    }
}

impl Interceptor for DataSourceGetConnectionInterceptor {
    fn name(&self) -> &str {
        "DataSourceGetConnectionInterceptor"
    }

    fn before(&self, ctx: &mut CallContext) -> HookResult<HookAction> {
        ctx.set_attribute(attr::SERVICE_TYPE, SERVICE_TYPE);
        // getConnection(String, String): record the user, never the password.
        if let Some(user) = ctx.arg(0).and_then(|v| v.as_str()).map(str::to_owned) {
            ctx.set_attribute(attr::DB_USER, user);
        }
        Ok(HookAction::Continue)
    }

    fn after(&self, ctx: &mut CallContext, _outcome: &CallOutcome<'_>) -> HookResult {
        let Some(monitor) = ctx.instance().and_then(|ds| self.states.get(ds)) else {
            return Ok(());
        };
        ctx.set_attribute(attr::POOL_URL, monitor.url());
        if let Some(active) = monitor.num_active() {
            ctx.set_attribute(attr::POOL_ACTIVE, active);
        }
        if let Some(max) = monitor.max_active() {
            ctx.set_attribute(attr::POOL_MAX, max);
        }
        Ok(())
    }
}
