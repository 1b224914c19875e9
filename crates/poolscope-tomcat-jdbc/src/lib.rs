//! # poolscope-tomcat-jdbc
//!
//! Tomcat JDBC connection-pool plugin for poolscope.
//!
//! Linking this crate registers [`TomcatJdbcPlugin`] for
//! [`AgentBuilder::discover_plugins`](poolscope::AgentBuilder::discover_plugins). It reads
//! two properties:
//!
//! | Property | Default | Effect |
//! |----------|---------|--------|
//! | `profiler.jdbc.tomcatjdbc` | `true` | enable the plugin |
//! | `profiler.jdbc.tomcatjdbc.connectionclose` | `false` | trace `ConnectionPool.close(boolean)` |

pub mod config;
pub mod constants;
pub mod interceptor;
pub mod monitor;
pub mod plugin;
pub mod targets;

pub use config::TomcatJdbcConfig;
pub use monitor::DataSourceMonitor;
pub use plugin::{PLUGIN_NAME, TomcatJdbcPlugin};
