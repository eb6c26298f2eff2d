//! Report store backed by a single JSON document file.
//!
//! The file holds a JSON array of reports. Writes run a locked
//! read-modify-write and replace the file through a temp-file rename, so a
//! reader never sees a half-written array. Subscriptions re-read the file
//! after every in-process write and on a poll interval, and push a snapshot
//! only when the content hash changed; other processes sharing the file are
//! picked up by the poll.

use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{
    ReportStore, StoreError, StoreEvent, Subscription, generate_document_id, order_newest_first,
};
use crate::lock::{LockMode, StoreLock};
use crate::model::{NewReport, Report, ReportPatch};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// Shortest poll period; tokio intervals cannot tick at zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct FileInner {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    poll_interval: Duration,
    revision: watch::Sender<u64>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<FileInner>,
}

impl JsonFileStore {
    /// Open (lazily) the store at `path`. A missing file is an empty board.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, DEFAULT_POLL_INTERVAL, DEFAULT_LOCK_TIMEOUT)
    }

    #[must_use]
    pub fn with_options(
        path: impl Into<PathBuf>,
        poll_interval: Duration,
        lock_timeout: Duration,
    ) -> Self {
        let path = path.into();
        let lock_path = sibling_with_suffix(&path, ".lock");
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(FileInner {
                path,
                lock_path,
                lock_timeout,
                poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
                revision,
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read the collection once, newest first.
    pub fn load(&self) -> Result<Vec<Report>, StoreError> {
        let bytes = self.inner.read_raw()?;
        parse_documents(&bytes, &self.inner.path)
    }

    async fn mutate<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Report>) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || inner.locked_rewrite(op))
            .await
            .map_err(|err| StoreError::Transport(format!("store worker failed: {err}")))??;
        self.inner.revision.send_modify(|rev| *rev += 1);
        Ok(result)
    }
}

impl FileInner {
    fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        let _lock = StoreLock::acquire(&self.lock_path, LockMode::Shared, self.lock_timeout)?;
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(io_error(&self.path, &err)),
        }
    }

    fn locked_rewrite<T>(
        &self,
        op: impl FnOnce(&mut Vec<Report>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = StoreLock::acquire(&self.lock_path, LockMode::Exclusive, self.lock_timeout)?;

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        let mut documents = parse_stored(&bytes, &self.path)?;
        let result = op(&mut documents)?;

        let encoded = serde_json::to_vec_pretty(&documents)
            .map_err(|err| StoreError::Transport(format!("encode store file: {err}")))?;
        let tmp = sibling_with_suffix(&self.path, ".tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
        }
        fs::write(&tmp, encoded).map_err(|err| io_error(&tmp, &err))?;
        fs::rename(&tmp, &self.path).map_err(|err| io_error(&self.path, &err))?;
        Ok(result)
    }
}

#[async_trait]
impl ReportStore for JsonFileStore {
    fn subscribe(&self) -> Subscription {
        let (tx, subscription) = Subscription::channel();
        let inner = Arc::clone(&self.inner);
        let mut revision = inner.revision.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_hash: Option<blake3::Hash> = None;
            let mut last_error: Option<String> = None;

            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    _ = ticker.tick() => {}
                    changed = revision.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let reader = Arc::clone(&inner);
                let read = tokio::task::spawn_blocking(move || reader.read_raw())
                    .await
                    .unwrap_or_else(|err| {
                        Err(StoreError::Transport(format!("store worker failed: {err}")))
                    });

                let event = match read {
                    Ok(bytes) => {
                        let hash = blake3::hash(&bytes);
                        if last_hash == Some(hash) {
                            continue;
                        }
                        last_hash = Some(hash);
                        match parse_documents(&bytes, &inner.path) {
                            Ok(reports) => StoreEvent::Snapshot(reports),
                            Err(err) => StoreEvent::Error(err.to_string()),
                        }
                    }
                    Err(err) => StoreEvent::Error(err.to_string()),
                };

                if let StoreEvent::Error(message) = &event {
                    // Unchanged content must still be re-sent once the error clears.
                    last_hash = None;
                    if last_error.as_deref() == Some(message.as_str()) {
                        continue;
                    }
                    warn!(path = %inner.path.display(), error = %message, "store subscription error");
                    last_error = Some(message.clone());
                } else {
                    last_error = None;
                }

                if tx.send(event).is_err() {
                    break;
                }
            }
            debug!(path = %inner.path.display(), "store subscription closed");
        });

        subscription
    }

    async fn create(&self, report: NewReport) -> Result<String, StoreError> {
        let id = generate_document_id();
        let doc = Report::from_new(id.clone(), report);
        self.mutate(move |documents| {
            documents.push(doc);
            Ok(())
        })
        .await?;
        debug!(id = %id, "file store: create");
        Ok(id)
    }

    async fn update(&self, id: &str, patch: ReportPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            let inner = Arc::clone(&self.inner);
            let target = id.to_string();
            let known = tokio::task::spawn_blocking(move || {
                let bytes = inner.read_raw()?;
                let documents = parse_stored(&bytes, &inner.path)?;
                Ok::<_, StoreError>(documents.iter().any(|report| report.id == target))
            })
            .await
            .map_err(|err| StoreError::Transport(format!("store worker failed: {err}")))??;
            return if known {
                debug!(id = %id, "file store: empty patch, nothing to write");
                Ok(())
            } else {
                Err(StoreError::NotFound(id.to_string()))
            };
        }

        let target = id.to_string();
        self.mutate(move |documents| {
            let report = documents
                .iter_mut()
                .find(|report| report.id == target)
                .ok_or_else(|| StoreError::NotFound(target.clone()))?;
            report.apply_patch(&patch);
            Ok(())
        })
        .await?;
        debug!(id = %id, "file store: update");
        Ok(())
    }
}

/// Decode stored documents in file order.
fn parse_stored(bytes: &[u8], path: &Path) -> Result<Vec<Report>, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).map_err(|err| {
        StoreError::Transport(format!("corrupt store file {}: {err}", path.display()))
    })
}

/// Decode stored documents in subscription order (newest first).
fn parse_documents(bytes: &[u8], path: &Path) -> Result<Vec<Report>, StoreError> {
    let mut reports = parse_stored(bytes, path)?;
    order_newest_first(&mut reports);
    Ok(reports)
}

fn io_error(path: &Path, err: &io::Error) -> StoreError {
    StoreError::Transport(format!("{}: {err}", path.display()))
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
