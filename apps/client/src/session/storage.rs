//! Durable key-value storage behind the session store.
//!
//! Reads and writes are batched: `get_all` sees one consistent snapshot,
//! and `set_all` and `remove_all` apply every key or none, so a reader never
//! observes a token without its user.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::errors::ClientError;

pub trait KeyValueStore: Send + Sync {
    /// Values for `keys`, in order, read from a single snapshot. Errors only
    /// when the backing medium is unreadable or corrupt.
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, ClientError>;
    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), ClientError>;
    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError>;

    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.get_all(&[key])?.pop().flatten())
    }
}

fn pick(map: &BTreeMap<String, String>, keys: &[&str]) -> Vec<Option<String>> {
    keys.iter().map(|key| map.get(*key).cloned()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, ClientError> {
        Ok(pick(&self.entries(), keys))
    }

    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), ClientError> {
        let mut map = self.entries();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = self.entries();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed
// ────────────────────────────────────────────────────────────────────────────

/// A JSON object file holding every key. Each write replaces the whole file
/// through a temp file + rename in the same directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(ClientError::Io(e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            ClientError::Storage(format!("corrupt session file {}: {e}", self.path.display()))
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, map)?;
        tmp.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)) {
                tracing::warn!("failed to chmod 0600 {}: {e}", tmp.path().display());
            }
        }

        tmp.persist(&self.path)
            .map_err(|e| ClientError::Storage(format!("write {}: {e}", self.path.display())))?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, ClientError> {
        let _guard = self.guard();
        Ok(pick(&self.read_map()?, keys))
    }

    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), ClientError> {
        let _guard = self.guard();
        // A corrupt file is replaced rather than merged into.
        let mut map = self.read_map().unwrap_or_default();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.write_map(&map)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError> {
        let _guard = self.guard();
        let mut map = match self.read_map() {
            Ok(map) => map,
            // Nothing trustworthy left to preserve.
            Err(_) => BTreeMap::new(),
        };
        for key in keys {
            map.remove(*key);
        }
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ClientError::Io(e)),
            };
        }
        self.write_map(&map)
    }
}
