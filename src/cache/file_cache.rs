use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use crate::cache::store::CacheStore;
use crate::utils::ensure_cache_dir_exists;
use log::{debug, info};
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default directory name, relative to the working directory, used by the
/// dashboard this crate backs.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// A flat directory of `<key>.json` files, one per entry.
///
/// There is no in-memory index: every call goes to disk. Writes land in a
/// temporary file first and are renamed over the target, so a reader sees
/// either the old entry or the new one, never a partial file.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Opens a cache rooted at `root`. The directory is created lazily on the
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    fn ensure_root(&self) -> Result<(), CacheError> {
        ensure_cache_dir_exists(&self.root)
    }
}

impl CacheStore for FileCache {
    fn load_value(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss for '{}'", key);
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Read(path, e)),
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt(path, e))?;
        debug!("Cache hit for '{}'", key);
        Ok(Some(value))
    }

    fn save_value(&self, key: &CacheKey, value: &Value) -> Result<(), CacheError> {
        self.ensure_root()?;
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Encode(key.to_string(), e))?;

        let mut temp_file =
            NamedTempFile::new_in(&self.root).map_err(|e| CacheError::Write(path.clone(), e))?;
        temp_file
            .write_all(&bytes)
            .map_err(|e| CacheError::Write(path.clone(), e))?;
        temp_file
            .flush()
            .map_err(|e| CacheError::Write(path.clone(), e))?;
        temp_file
            .persist(&path)
            .map_err(|e| CacheError::Write(path.clone(), e.error))?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Invalidated cache entry '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Delete(path, e)),
        }
    }
}
