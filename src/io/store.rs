use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::io::lock::{LockError, StoreLock};
use crate::io::recovery::atomic_write;
use crate::model::config::{Config, StoreConfig};
use crate::model::store::ListStore;

/// Error type for persisting the store
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("could not serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Raised by committers that refuse writes (tests, read-only mounts)
    #[error("commit rejected: {0}")]
    Rejected(String),
}

/// Error type for loading the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Durable sink for the full store state.
///
/// A commit either persists all of `store` or returns an error and leaves
/// the previously committed state in place.
pub trait Commit {
    fn commit(&mut self, store: &ListStore) -> Result<(), CommitError>;
}

/// The store as a single pretty-printed JSON file inside the data directory
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data_dir: PathBuf,
    settings: StoreConfig,
    held: Option<StoreLock>,
}

impl JsonStore {
    pub fn open(data_dir: &Path, config: &Config) -> Self {
        JsonStore {
            path: data_dir.join(&config.store.file),
            data_dir: data_dir.to_path_buf(),
            settings: config.store.clone(),
            held: None,
        }
    }

    /// Take the store lock until this `JsonStore` is dropped. Call before
    /// `load` when the loaded state will be edited and committed.
    pub fn hold_lock(&mut self) -> Result<(), LockError> {
        if self.held.is_none() {
            self.held = Some(StoreLock::acquire(&self.data_dir, &self.settings)?);
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read the store. A missing file is an empty store.
    pub fn load(&self) -> Result<ListStore, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet");
                return Ok(ListStore::new());
            }
            Err(e) => {
                return Err(StoreError::ReadError {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let store: ListStore =
            serde_json::from_str(&text).map_err(|e| StoreError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
        debug!(path = %self.path.display(), lists = store.lists().len(), "loaded store");
        Ok(store)
    }
}

impl Commit for JsonStore {
    fn commit(&mut self, store: &ListStore) -> Result<(), CommitError> {
        let mut json = serde_json::to_string_pretty(store)?;
        json.push('\n');
        let _lock = match self.held {
            Some(_) => None,
            None => Some(StoreLock::acquire(&self.data_dir, &self.settings)?),
        };
        atomic_write(&self.path, json.as_bytes()).map_err(|e| CommitError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        info!(path = %self.path.display(), bytes = json.len(), "committed store");
        Ok(())
    }
}
