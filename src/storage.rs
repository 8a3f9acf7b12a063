// Manages the on-disk event file.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to the serialized shape of `Entry` (or `ParsedEvent`, which it
// flattens) require incrementing EVENTS_STORAGE_VERSION below.
use crate::store::Entry;
use anyhow::Result;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

// Version history:
// - v1: id, flattened ParsedEvent fields, notified flag
pub const EVENTS_STORAGE_VERSION: u32 = 1;

/// Everything persisted in `events.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredEvents {
    #[serde(default)]
    pub version: u32,
    /// Next id to hand out. Ids are never reused, even after deletes.
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

fn first_id() -> u64 {
    1
}

impl StoredEvents {
    pub fn empty() -> Self {
        Self {
            version: EVENTS_STORAGE_VERSION,
            next_id: first_id(),
            entries: Vec::new(),
        }
    }
}

/// Tracks whether the last load of each file succeeded.
/// Saving over a file we could not read would silently drop its contents.
static LOAD_STATE_MAP: OnceLock<Mutex<HashMap<PathBuf, LoadState>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Uninitialized,
    Success,
    Failed,
}

impl LoadState {
    fn get(path: &Path) -> LoadState {
        let map = LOAD_STATE_MAP.get_or_init(|| Mutex::new(HashMap::new()));
        let map = map.lock().unwrap_or_else(|e| e.into_inner());
        *map.get(path).unwrap_or(&LoadState::Uninitialized)
    }

    fn set(path: &Path, state: LoadState) {
        let map = LOAD_STATE_MAP.get_or_init(|| Mutex::new(HashMap::new()));
        map.lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf(), state);
    }
}

pub struct LocalStorage;

impl LocalStorage {
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock on a `.lock` sidecar file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Reads the event file. A missing file is an empty store.
    ///
    /// Errors are never swallowed: a failed load also blocks [`save_events`]
    /// for the same path until a later load succeeds.
    ///
    /// [`save_events`]: LocalStorage::save_events
    pub fn load_events(path: &Path) -> Result<StoredEvents> {
        if !path.exists() {
            LoadState::set(path, LoadState::Success);
            return Ok(StoredEvents::empty());
        }

        let result = Self::with_lock(path, || {
            let json = fs::read_to_string(path)?;
            Self::decode(&json)
        });

        match &result {
            Ok(_) => LoadState::set(path, LoadState::Success),
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                LoadState::set(path, LoadState::Failed)
            }
        }
        result
    }

    fn decode(json: &str) -> Result<StoredEvents> {
        let data: StoredEvents = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Failed to parse event file: {}", e))?;

        if data.version > EVENTS_STORAGE_VERSION {
            return Err(anyhow::anyhow!(
                "Event file version {} is newer than supported version {}",
                data.version,
                EVENTS_STORAGE_VERSION
            ));
        }
        Ok(data)
    }

    pub fn save_events(path: &Path, data: &StoredEvents) -> Result<()> {
        if !Self::can_save(path) {
            return Err(anyhow::anyhow!(
                "Cannot save {}: previous load failed. This prevents overwriting data that couldn't be read.",
                path.display()
            ));
        }
        Self::with_lock(path, || Self::write_locked(path, data))
    }

    /// Writes without taking the lock; the caller must already hold it.
    pub fn write_locked(path: &Path, data: &StoredEvents) -> Result<()> {
        let data = StoredEvents {
            version: EVENTS_STORAGE_VERSION,
            ..data.clone()
        };
        let json = serde_json::to_string_pretty(&data)?;
        Self::atomic_write(path, json)
    }

    /// Reads the file while the caller already holds the lock.
    pub fn read_locked(path: &Path) -> Result<StoredEvents> {
        if !path.exists() {
            return Ok(StoredEvents::empty());
        }
        let json = fs::read_to_string(path)?;
        Self::decode(&json)
    }

    /// Load, mutate and save as one locked step so concurrent processes
    /// cannot interleave between the read and the write.
    pub fn modify_events<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoredEvents) -> Result<T>,
    {
        if !Self::can_save(path) {
            return Err(anyhow::anyhow!(
                "Cannot modify {}: previous load failed.",
                path.display()
            ));
        }
        Self::with_lock(path, || {
            let mut data = match Self::read_locked(path) {
                Ok(d) => d,
                Err(e) => {
                    LoadState::set(path, LoadState::Failed);
                    return Err(e);
                }
            };
            LoadState::set(path, LoadState::Success);
            let out = f(&mut data)?;
            Self::write_locked(path, &data)?;
            Ok(out)
        })
    }

    pub fn can_save(path: &Path) -> bool {
        match LoadState::get(path) {
            LoadState::Uninitialized | LoadState::Success => true,
            LoadState::Failed => false,
        }
    }
}
