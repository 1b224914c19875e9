use serde::Deserialize;
use std::collections::BTreeMap;

/// Agent-wide profiler configuration.
///
/// A flat property map (`profiler.jdbc.tomcatjdbc = true`, ...) handed to every plugin
/// during setup. Loading it from files or the environment is the host's job; this type
/// only stores and interprets the values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProfilerConfig {
    properties: BTreeMap<String, String>,
}

impl ProfilerConfig {
    /// Create an empty configuration (every lookup falls back to its default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a boolean property.
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.with_property(key, value.to_string())
    }

    /// Raw property value, trimmed.
    pub fn read_string(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.trim())
    }

    /// Read a boolean property.
    ///
    /// Missing keys yield `default`. Present keys are `true` only when they spell `true`
    /// (case-insensitive); any other value reads as `false`.
    pub fn read_bool(&self, key: &str, default: bool) -> bool {
        match self.read_string(key) {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    /// Number of properties set.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no properties are set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProfilerConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bool_defaults_when_missing() {
        let config = ProfilerConfig::new();
        assert!(config.read_bool("profiler.missing", true));
        assert!(!config.read_bool("profiler.missing", false));
    }

    #[test]
    fn read_bool_parses_present_values() {
        let config = ProfilerConfig::new()
            .with_property("a", " TRUE ")
            .with_property("b", "false")
            .with_property("c", "yes");
        assert!(config.read_bool("a", false));
        assert!(!config.read_bool("b", true));
        assert!(!config.read_bool("c", true));
    }

    #[test]
    fn deserializes_from_flat_map() {
        let config: ProfilerConfig =
            serde_json::from_str(r#"{"profiler.jdbc.tomcatjdbc": "false"}"#).unwrap();
        assert_eq!(config.len(), 1);
        assert!(!config.read_bool("profiler.jdbc.tomcatjdbc", true));
    }
}
