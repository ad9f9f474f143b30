use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Cache path exists but is not a directory: '{0}'")]
    NotADirectory(PathBuf),

    #[error("Failed to read cache file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Cache file '{0}' does not contain valid JSON")]
    Corrupt(PathBuf, #[source] serde_json::Error),

    // Valid JSON, but not the shape the caller asked for.
    #[error("Failed to decode cache entry '{0}'")]
    Decode(String, #[source] serde_json::Error),

    #[error("Failed to encode cache data for key '{0}'")]
    Encode(String, #[source] serde_json::Error),

    #[error("Failed to write cache file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cache file '{0}'")]
    Delete(PathBuf, #[source] std::io::Error),
}
