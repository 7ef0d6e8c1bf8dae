//! # Durable Key-Value Storage
//!
//! The history log lives under one fixed key in a small key-value store.
//! Two implementations:
//!
//! - [`FileStore`]: one JSON file per key in a directory, written atomically
//!   (temp file, fsync, rename) under an OS advisory lock
//! - [`MemoryStore`]: in-process map for tests and throwaway sessions
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::storage::{FileStore, KeyValueStore};
//!
//! let store = FileStore::open("/tmp/calc")?;
//! store.set("calcHistory", "[]")?;
//! assert_eq!(store.get("calcHistory")?.as_deref(), Some("[]"));
//! store.remove("calcHistory")?;
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{CalcError, CalcResult};

/// String-keyed persistence. Values are opaque strings (JSON in practice).
pub trait KeyValueStore: Send + Sync {
    /// Read a key. A key that was never written (or was removed) is `None`.
    fn get(&self, key: &str) -> CalcResult<Option<String>>;

    /// Write a key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> CalcResult<()>;

    /// Delete a key. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> CalcResult<()>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Map-backed store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().map(|map| map.contains_key(key)).unwrap_or(false)
    }

    fn lock(&self) -> CalcResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CalcError::storage("lock", "*", "memory store poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CalcResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CalcResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CalcResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::fs::{self, File, OpenOptions};
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};

    use fs2::FileExt;
    use tracing::debug;

    use super::KeyValueStore;
    use crate::errors::{CalcError, CalcResult};

    /// Directory-backed store: key `k` lives in `<dir>/k.json`.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        /// Open (and create if needed) a store rooted at `dir`.
        pub fn open(dir: impl Into<PathBuf>) -> CalcResult<Self> {
            let dir = dir.into();
            fs::create_dir_all(&dir).map_err(|e| {
                CalcError::storage("create directory", dir.display().to_string(), e.to_string())
            })?;
            Ok(FileStore { dir })
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        /// File holding the value for `key`
        pub fn path_for(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{}.json", sanitize_key(key)))
        }

        /// Hold the key's advisory lock for the lifetime of the returned file.
        fn lock_key(&self, key: &str) -> CalcResult<File> {
            let lock_path = self.dir.join(format!("{}.json.lock", sanitize_key(key)));
            let lock_file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|e| CalcError::storage("create lock", key, e.to_string()))?;

            lock_file
                .lock_exclusive()
                .map_err(|e| CalcError::storage("lock", key, e.to_string()))?;

            Ok(lock_file)
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> CalcResult<Option<String>> {
            let path = self.path_for(key);
            match fs::read_to_string(&path) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CalcError::storage("read", key, e.to_string())),
            }
        }

        /// Write with atomic semantics: temp file, fsync, rename.
        fn set(&self, key: &str, value: &str) -> CalcResult<()> {
            let _lock = self.lock_key(key)?;
            let path = self.path_for(key);
            let tmp_path = path.with_extension("json.tmp");

            let mut tmp_file = File::create(&tmp_path)
                .map_err(|e| CalcError::storage("create temp file", key, e.to_string()))?;

            tmp_file
                .write_all(value.as_bytes())
                .map_err(|e| CalcError::storage("write temp file", key, e.to_string()))?;

            tmp_file
                .sync_all()
                .map_err(|e| CalcError::storage("sync temp file", key, e.to_string()))?;

            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                CalcError::storage("rename to final", key, e.to_string())
            })?;

            debug!(key, path = %path.display(), bytes = value.len(), "stored value");
            Ok(())
        }

        fn remove(&self, key: &str) -> CalcResult<()> {
            let _lock = self.lock_key(key)?;
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CalcError::storage("remove", key, e.to_string())),
            }
        }
    }

    /// Keep keys from escaping the store directory
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_key_paths_stay_inside_dir() {
            let store = FileStore { dir: PathBuf::from("/data/calc") };
            assert_eq!(store.path_for("calcHistory"), Path::new("/data/calc/calcHistory.json"));
            assert_eq!(store.path_for("../etc/passwd"), Path::new("/data/calc/___etc_passwd.json"));
        }

        #[test]
        fn test_set_get_remove() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileStore::open(dir.path()).unwrap();

            assert_eq!(store.get("calcHistory").unwrap(), None);
            store.set("calcHistory", "[1]").unwrap();
            assert_eq!(store.get("calcHistory").unwrap().as_deref(), Some("[1]"));

            store.set("calcHistory", "[2]").unwrap();
            assert_eq!(store.get("calcHistory").unwrap().as_deref(), Some("[2]"));

            store.remove("calcHistory").unwrap();
            assert_eq!(store.get("calcHistory").unwrap(), None);
            assert!(!store.path_for("calcHistory").exists());
        }

        #[test]
        fn test_atomic_set_leaves_no_tmp_file() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileStore::open(dir.path()).unwrap();
            store.set("calcHistory", "{}").unwrap();

            let tmp_path = store.path_for("calcHistory").with_extension("json.tmp");
            assert!(!tmp_path.exists());
        }

        #[test]
        fn test_remove_missing_key_is_ok() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileStore::open(dir.path()).unwrap();
            assert!(store.remove("never-written").is_ok());
        }

        #[test]
        fn test_open_creates_directory() {
            let dir = tempfile::tempdir().unwrap();
            let nested = dir.path().join("a").join("b");
            let store = FileStore::open(&nested).unwrap();
            assert!(store.dir().is_dir());
        }
    }
}
