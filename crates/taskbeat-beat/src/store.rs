//! Persisted schedule stores.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::entry::ScheduleEntry;
use crate::error::StoreError;

/// Durable `name -> entry` map owned by the clock service.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<ScheduleEntry>, StoreError>;

    /// Insert or replace the entry stored under `entry.name`.
    async fn set(&self, entry: ScheduleEntry) -> Result<(), StoreError>;

    /// All entries, ordered by name.
    async fn entries(&self) -> Result<Vec<ScheduleEntry>, StoreError>;

    /// Make pending changes durable.
    async fn sync(&self) -> Result<(), StoreError>;

    /// Flush and release the store. Later calls fail with `Closed`.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens a schedule store when the clock service starts.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn ScheduleStore>, StoreError>;
}

/// In-memory store.
///
/// Handles returned by [`MemoryScheduleStore::handle`] and by its
/// [`StoreOpener`] impl share the same entries, so data outlives a closed
/// handle the way a file outlives a process.
pub struct MemoryScheduleStore {
    entries: Arc<Mutex<BTreeMap<String, ScheduleEntry>>>,
    closes: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            closes: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    /// Seed with existing entries.
    pub fn with_entries(entries: impl IntoIterator<Item = ScheduleEntry>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .extend(entries.into_iter().map(|e| (e.name.clone(), e)));
        store
    }

    /// An open handle on the same entries.
    pub fn handle(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            closes: self.closes.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// How many handles have been closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Read an entry without going through an open handle.
    pub fn snapshot(&self, name: &str) -> Option<ScheduleEntry> {
        self.entries.lock().get(name).cloned()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn get(&self, name: &str) -> Result<Option<ScheduleEntry>, StoreError> {
        self.ensure_open()?;
        Ok(self.entries.lock().get(name).cloned())
    }

    async fn set(&self, entry: ScheduleEntry) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.entries.lock().insert(entry.name.clone(), entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<ScheduleEntry>, StoreError> {
        self.ensure_open()?;
        Ok(self.entries.lock().values().cloned().collect())
    }

    async fn sync(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreOpener for MemoryScheduleStore {
    async fn open(&self) -> Result<Arc<dyn ScheduleStore>, StoreError> {
        let store: Arc<dyn ScheduleStore> = Arc::new(self.handle());
        Ok(store)
    }
}

const SCHEDULE_FORMAT_VERSION: u32 = 1;

/// On-disk layout of the schedule file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScheduleDocument {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, ScheduleEntry>,
}

#[derive(Default)]
struct FileState {
    entries: BTreeMap<String, ScheduleEntry>,
    dirty: bool,
    closed: bool,
}

/// Schedule persisted as a single JSON document.
///
/// Writes go to a temporary sibling file that is renamed over the
/// schedule, so a crash leaves either the old or the new schedule. A store
/// dropped with unsynced changes writes them out synchronously.
pub struct FileScheduleStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileScheduleStore {
    /// Open the schedule at `path`, starting empty when it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let entries = match fs::read_to_string(&path).await {
            Ok(content) => parse_document(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Opened schedule {:?} with {} entries", path, entries.len());

        Ok(Self {
            path,
            state: Mutex::new(FileState {
                entries,
                ..Default::default()
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Serialize the current entries if they changed since the last write.
    fn pending_document(&self) -> Result<Option<String>, StoreError> {
        let state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        if !state.dirty {
            return Ok(None);
        }
        let document = ScheduleDocument {
            version: SCHEDULE_FORMAT_VERSION,
            entries: state.entries.clone(),
        };
        Ok(Some(serde_json::to_string_pretty(&document)?))
    }

    async fn write_document(&self, content: String) -> Result<(), StoreError> {
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).await?;
        file.write_all(content.as_bytes()).await?;
        // The rename must not expose a file whose data is still in cache.
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp, &self.path).await?;
        self.state.lock().dirty = false;
        debug!("Wrote schedule {:?}", self.path);
        Ok(())
    }

    fn with_open_state<T>(&self, f: impl FnOnce(&mut FileState) -> T) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(f(&mut state))
    }
}

fn parse_document(path: &Path, content: &str) -> Result<BTreeMap<String, ScheduleEntry>, StoreError> {
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let document: ScheduleDocument =
        serde_json::from_str(content).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if document.version != SCHEDULE_FORMAT_VERSION {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            message: format!("unsupported version {}", document.version),
        });
    }
    Ok(document.entries)
}

#[async_trait]
impl ScheduleStore for FileScheduleStore {
    async fn get(&self, name: &str) -> Result<Option<ScheduleEntry>, StoreError> {
        self.with_open_state(|state| state.entries.get(name).cloned())
    }

    async fn set(&self, entry: ScheduleEntry) -> Result<(), StoreError> {
        self.with_open_state(|state| {
            state.entries.insert(entry.name.clone(), entry);
            state.dirty = true;
        })
    }

    async fn entries(&self) -> Result<Vec<ScheduleEntry>, StoreError> {
        self.with_open_state(|state| state.entries.values().cloned().collect())
    }

    async fn sync(&self) -> Result<(), StoreError> {
        if let Some(content) = self.pending_document()? {
            self.write_document(content).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.state.lock().closed {
            return Ok(());
        }
        let result = self.sync().await;
        self.state.lock().closed = true;
        info!("Closed schedule {:?}", self.path);
        result
    }
}

impl Drop for FileScheduleStore {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.closed || !state.dirty {
            return;
        }
        let document = ScheduleDocument {
            version: SCHEDULE_FORMAT_VERSION,
            entries: std::mem::take(&mut state.entries),
        };
        let temp = self.temp_path();
        let written = serde_json::to_string_pretty(&document)
            .map_err(std::io::Error::other)
            .and_then(|content| write_synced(&temp, &content))
            .and_then(|()| std::fs::rename(&temp, &self.path));
        if let Err(e) = written {
            error!("Failed to flush schedule {:?} on drop: {}", self.path, e);
        }
    }
}

fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Opens a [`FileScheduleStore`] at a fixed path.
pub struct FileStoreOpener {
    path: PathBuf,
}

impl FileStoreOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreOpener for FileStoreOpener {
    async fn open(&self) -> Result<Arc<dyn ScheduleStore>, StoreError> {
        let store: Arc<dyn ScheduleStore> = Arc::new(FileScheduleStore::open(self.path.clone()).await?);
        Ok(store)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
