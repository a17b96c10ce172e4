//! Cache Store Module
//!
//! Persistence hooks for the engine and their file-backed implementation:
//! one `<dir>/<key>.cache` file per key.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

/// Extension of every entry file
pub const CACHE_EXTENSION: &str = "cache";

/// Extension of the in-flight file a save writes before renaming
const TEMP_EXTENSION: &str = "tmp";

/// Byte-level persistence for envelopes, keyed by sanitized storage keys.
pub trait CacheStore: Send + Sync {
    /// Writes (or replaces) the envelope for `key`.
    fn save(&self, key: &str, envelope: &[u8]) -> io::Result<()>;

    /// Reads the envelope for `key`, `None` when absent.
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Deletes the envelope for `key`. Returns whether anything was removed.
    fn remove(&self, key: &str) -> io::Result<bool>;

    /// Deletes every envelope in this store. Returns how many were removed.
    fn clear_all(&self) -> io::Result<usize>;

    /// All stored keys, oldest write first.
    fn keys_by_age(&self) -> io::Result<Vec<String>>;
}

// == File Cache Store ==
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Opens the store at `dir`, creating the directory if needed.
    ///
    /// Temp files left by a save that never reached its rename are deleted.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let store = Self { dir };

        let stale = store.remove_temp_files()?;
        if stale > 0 {
            warn!(count = stale, "Removed temp files left by interrupted writes");
        }
        debug!(dir = %store.dir.display(), "cache directory ready");
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, CACHE_EXTENSION))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.{}", key, TEMP_EXTENSION))
    }

    fn remove_temp_files(&self) -> io::Result<usize> {
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
                && path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXTENSION);
            if !is_temp {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    fn entry_files(&self) -> io::Result<Vec<(PathBuf, SystemTime)>> {
        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                // Removed by someone else between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
        Ok(files)
    }
}

impl CacheStore for FileCacheStore {
    fn save(&self, key: &str, envelope: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp = self.temp_path_for(key);
        fs::write(&tmp, envelope)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove(&self, key: &str) -> io::Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn clear_all(&self) -> io::Result<usize> {
        self.remove_temp_files()?;
        let mut removed = 0;
        for (path, _) in self.entry_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    fn keys_by_age(&self) -> io::Result<Vec<String>> {
        let mut files: Vec<(String, SystemTime)> = self
            .entry_files()?
            .into_iter()
            .filter_map(|(path, modified)| {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, modified))
            })
            .collect();
        files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(files.into_iter().map(|(key, _)| key).collect())
    }
}
