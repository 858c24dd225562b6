use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration from `.checklist/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file name, relative to the data directory
    #[serde(default = "default_store_file")]
    pub file: String,
    /// How long to wait for the store lock before giving up
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_store_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragConfig {
    /// Upper bound on how long a dragged item's subtree stays collapsed
    /// without a drop or cancel
    #[serde(default = "default_collapse_timeout_ms")]
    pub collapse_timeout_ms: u64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            collapse_timeout_ms: default_collapse_timeout_ms(),
        }
    }
}

impl DragConfig {
    pub fn collapse_timeout(&self) -> Duration {
        Duration::from_millis(self.collapse_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive used when `CK_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_store_file() -> String {
    "lists.json".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_collapse_timeout_ms() -> u64 {
    3000
}

fn default_log_filter() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.file, "lists.json");
        assert_eq!(config.drag.collapse_timeout(), Duration::from_secs(3));
        assert_eq!(config.store.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn test_partial_tables() {
        let config: Config = toml::from_str(
            r#"
[drag]
collapse_timeout_ms = 1500

[store]
file = "trips.json"
"#,
        )
        .unwrap();
        assert_eq!(config.drag.collapse_timeout_ms, 1500);
        assert_eq!(config.store.file, "trips.json");
        assert_eq!(config.store.lock_timeout_ms, 5000);
    }
}
