use super::attr;
use crate::constants::SERVICE_TYPE;
use poolscope::{CallContext, HookAction, HookResult, Interceptor};

/// Traces `ConnectionPool.close(boolean)`.
#[derive(Debug, Default)]
pub struct DataSourceCloseConnectionInterceptor;

impl Interceptor for DataSourceCloseConnectionInterceptor {
    fn name(&self) -> &str {
        "DataSourceCloseConnectionInterceptor"
    }

    fn before(&self, ctx: &mut CallContext) -> HookResult<HookAction> {
        ctx.set_attribute(attr::SERVICE_TYPE, SERVICE_TYPE);
        if let Some(force) = ctx.arg(0).and_then(|v| v.as_bool()) {
            ctx.set_attribute(attr::CLOSE_FORCE, force);
        }
        Ok(HookAction::Continue)
    }
}
