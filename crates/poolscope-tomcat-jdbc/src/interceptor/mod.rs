//! Interceptors bound by [`TomcatJdbcPlugin`](crate::TomcatJdbcPlugin).

mod close;
mod close_connection;
mod constructor;
mod get_connection;

pub use close::DataSourceCloseInterceptor;
pub use close_connection::DataSourceCloseConnectionInterceptor;
pub use constructor::DataSourceConstructorInterceptor;
pub use get_connection::DataSourceGetConnectionInterceptor;

use crate::monitor::DataSourceMonitor;
use poolscope::MonitorStateHolder;
use std::sync::Arc;

/// Per-`DataSourceProxy` monitor state shared by the plugin's interceptors.
pub type MonitorStates = Arc<MonitorStateHolder<DataSourceMonitor>>;

/// Span attribute keys.
pub mod attr {
    /// Service type of the traced library, always `TOMCAT_JDBC`.
    pub const SERVICE_TYPE: &str = "service.type";
    /// User passed to `getConnection(String, String)`.
    pub const DB_USER: &str = "db.user";
    /// JDBC URL of the monitored pool.
    pub const POOL_URL: &str = "pool.url";
    /// Connections checked out once the call returned.
    pub const POOL_ACTIVE: &str = "pool.active";
    /// Maximum pool size.
    pub const POOL_MAX: &str = "pool.max";
    /// The `force` argument of `ConnectionPool.close(boolean)`.
    pub const CLOSE_FORCE: &str = "close.force";
}
