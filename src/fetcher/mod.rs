pub mod grid_fetcher;
pub mod key_locks;
pub mod progress;
