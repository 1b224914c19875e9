use poolscope::ProfilerConfig;
use serde::Deserialize;
use std::fmt;

/// Property enabling the plugin.
pub const PLUGIN_ENABLE_KEY: &str = "profiler.jdbc.tomcatjdbc";
/// Property enabling interception of the pool-guard close path.
pub const PROFILE_CLOSE_KEY: &str = "profiler.jdbc.tomcatjdbc.connectionclose";

/// Tomcat JDBC plugin options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TomcatJdbcConfig {
    /// Whether the plugin registers anything at all (default `true`).
    pub plugin_enable: bool,
    /// Whether `ConnectionPool.close(boolean)` is traced (default `false`).
    pub profile_close: bool,
}

impl Default for TomcatJdbcConfig {
    fn default() -> Self {
        Self {
            plugin_enable: true,
            profile_close: false,
        }
    }
}

impl TomcatJdbcConfig {
    /// Read the options from the agent's property map.
    pub fn from_profiler_config(config: &ProfilerConfig) -> Self {
        let defaults = Self::default();
        Self {
            plugin_enable: config.read_bool(PLUGIN_ENABLE_KEY, defaults.plugin_enable),
            profile_close: config.read_bool(PROFILE_CLOSE_KEY, defaults.profile_close),
        }
    }
}

impl fmt::Display for TomcatJdbcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TomcatJdbcConfig{{pluginEnable={}, profileClose={}}}",
            self.plugin_enable, self.profile_close
        )
    }
}
