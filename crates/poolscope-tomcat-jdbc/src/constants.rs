use poolscope::ScopeId;

/// Scope shared by every Tomcat JDBC interceptor.
pub const SCOPE: ScopeId = ScopeId::new("TOMCAT_JDBC_SCOPE");

/// Service type recorded on spans.
pub const SERVICE_TYPE: &str = "TOMCAT_JDBC";

pub const DATA_SOURCE_PROXY: &str = "org.apache.tomcat.jdbc.pool.DataSourceProxy";
pub const CONNECTION_POOL: &str = "org.apache.tomcat.jdbc.pool.ConnectionPool";
pub const POOL_CONFIGURATION: &str = "org.apache.tomcat.jdbc.pool.PoolConfiguration";

pub const GET_URL: &str = "getUrl";
pub const GET_NUM_ACTIVE: &str = "getNumActive";
pub const GET_MAX_ACTIVE: &str = "getMaxActive";

/// Accessors a `DataSourceProxy` must expose for pool monitoring.
pub const MONITOR_ACCESSORS: [&str; 3] = [GET_URL, GET_NUM_ACTIVE, GET_MAX_ACTIVE];
