//! Advisory locking around the JSON store file.
//!
//! The lock lives on a `<store>.lock` sibling, never on the store file
//! itself: writers replace the store by rename, which would orphan a lock
//! taken on the old inode.

use fs2::FileExt;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ErrorCode;
use crate::store::StoreError;

const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Readers share the lock; a read-modify-write cycle holds it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Exclusive => "exclusive",
        })
    }
}

/// Held advisory lock. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    mode: LockMode,
}

impl StoreLock {
    /// Take the lock at `path`, retrying until `timeout` has passed.
    ///
    /// A lock that stays contended maps to `E5002`; anything the file
    /// system refuses maps to `E1004`.
    pub fn acquire(path: &Path, mode: LockMode, timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| unavailable(path, &err))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|err| unavailable(path, &err))?;

        let started = Instant::now();
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match attempt {
                Ok(()) => return Ok(Self { file, mode }),
                Err(err) if is_contended(&err) => {}
                Err(err) => return Err(unavailable(path, &err)),
            }

            if started.elapsed() >= timeout {
                return Err(StoreError::Transport(format!(
                    "{}: {mode} lock on {} not granted within {timeout:?}",
                    ErrorCode::LockContention,
                    path.display()
                )));
            }
            thread::sleep(RETRY_DELAY);
        }
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn unavailable(path: &Path, err: &io::Error) -> StoreError {
    StoreError::Transport(format!(
        "{}: cannot lock {}: {err}",
        ErrorCode::StoreUnavailable,
        path.display()
    ))
}
