use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::model::config::StoreConfig;

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = ".lock";

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive claim on a data directory's store.
///
/// A write session takes it before reading the store and drops it after the
/// commit, so two `ck` processes never interleave a read-modify-write. The
/// lock file itself stays on disk: unlinking it on release would let a
/// waiter lock an orphaned inode while a newcomer locks a fresh file.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
    acquired: Instant,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: {source}")]
    Flock {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store is busy: {path} still locked after {waited_ms}ms (another ck process is writing)")]
    Busy { path: PathBuf, waited_ms: u128 },
}

impl StoreLock {
    /// Wait up to the configured `lock_timeout_ms` for the store in
    /// `data_dir`. A zero timeout makes a single attempt.
    pub fn acquire(data_dir: &Path, store: &StoreConfig) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = store.lock_timeout();
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let busy = try_exclusive(&file).map_err(|source| LockError::Flock {
                path: path.clone(),
                source,
            })?;
            if !busy {
                if attempts > 1 {
                    debug!(path = %path.display(), attempts, "store lock acquired after waiting");
                } else {
                    trace!(path = %path.display(), "store lock acquired");
                }
                return Ok(StoreLock {
                    file,
                    path,
                    acquired: Instant::now(),
                });
            }
            let waited = started.elapsed();
            if waited >= deadline {
                return Err(LockError::Busy {
                    path,
                    waited_ms: waited.as_millis(),
                });
            }
            thread::sleep(RETRY_INTERVAL.min(deadline - waited));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        unlock(&self.file);
        trace!(
            path = %self.path.display(),
            held_ms = self.acquired.elapsed().as_millis() as u64,
            "store lock released"
        );
    }
}

/// One non-blocking attempt. `Ok(true)` means another holder has it.
#[cfg(unix)]
fn try_exclusive(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(false);
    }
    let err = std::io::Error::last_os_error();
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(true),
        _ => Err(err),
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

// Advisory only: other platforms get no cross-process exclusion
#[cfg(not(unix))]
fn try_exclusive(_file: &File) -> std::io::Result<bool> {
    Ok(false)
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}
