pub mod error;
pub mod file_cache;
pub mod key;
pub mod store;
