use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::io::recovery::atomic_write;
use crate::model::config::Config;

/// Name of the data directory holding config, store and logs
pub const DATA_DIR: &str = ".checklist";

const CONFIG_FILE: &str = "config.toml";

const CONFIG_TEMPLATE: &str = r#"# ck configuration

[store]
# Store file, relative to this directory
file = "lists.json"
# How long a writer waits for another ck process to finish (milliseconds)
lock_timeout_ms = 5000

[drag]
# A dragged item's subtree is re-expanded if no drop arrives within this time
collapse_timeout_ms = 3000

[log]
# tracing filter used when CK_LOG is unset, e.g. "info" or "checklist=debug"
filter = "warn"
"#;

/// Error type for locating and reading the data directory
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no .checklist/ directory found here or in any parent (run `ck init`)")]
    NotInitialized,
    #[error("{0} already exists (use --force to overwrite the config)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Walk up from `start` looking for `.checklist/config.toml`.
/// Returns the data directory itself.
pub fn discover_data_dir(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR);
        if data_dir.join(CONFIG_FILE).is_file() {
            debug!(path = %data_dir.display(), "found data directory");
            return Ok(data_dir);
        }
        if !current.pop() {
            return Err(ConfigError::NotInitialized);
        }
    }
}

pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Create `.checklist/` under `root` with a commented config. An existing
/// store file is left alone; `force` only permits rewriting the config.
pub fn init_data_dir(root: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let data_dir = root.join(DATA_DIR);
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(ConfigError::AlreadyInitialized(data_dir));
    }
    fs::create_dir_all(&data_dir)?;
    atomic_write(&config_path, CONFIG_TEMPLATE.as_bytes())?;
    info!(path = %data_dir.display(), "initialized data directory");
    Ok(data_dir)
}
