use crate::cache::error::CacheError;
use crate::forecast::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteoGridError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Saved configuration has version {found}, expected {expected}")]
    UnsupportedConfigVersion { found: u32, expected: u32 },
}
