//! Methods the plugin intercepts.

use crate::constants::{CONNECTION_POOL, DATA_SOURCE_PROXY, POOL_CONFIGURATION};
use poolscope::InterceptionTarget;

/// `DataSourceProxy(PoolConfiguration)`.
pub fn data_source_constructor() -> InterceptionTarget {
    InterceptionTarget::constructor(DATA_SOURCE_PROXY, &[POOL_CONFIGURATION])
}

/// `DataSourceProxy.close(boolean)`.
pub fn data_source_close() -> InterceptionTarget {
    InterceptionTarget::method(DATA_SOURCE_PROXY, "close", &["boolean"])
}

/// `DataSourceProxy.getConnection()`.
pub fn get_connection() -> InterceptionTarget {
    InterceptionTarget::method(DATA_SOURCE_PROXY, "getConnection", &[])
}

/// `DataSourceProxy.getConnection(String, String)`.
pub fn get_connection_with_credentials() -> InterceptionTarget {
    InterceptionTarget::method(
        DATA_SOURCE_PROXY,
        "getConnection",
        &["java.lang.String", "java.lang.String"],
    )
}

/// `ConnectionPool.close(boolean)`.
pub fn connection_pool_close() -> InterceptionTarget {
    InterceptionTarget::method(CONNECTION_POOL, "close", &["boolean"])
}
