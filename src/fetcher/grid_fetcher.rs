//! Bulk retrieval of archive data for a set of grid points.
//!
//! Every point is resolved through the cache first; misses are fetched from
//! the archive endpoint with at most `max_in_flight` requests outstanding and
//! written back. A point that fails is logged and left out of the result; it
//! never aborts the others.

use crate::cache::key::CacheKey;
use crate::cache::store::{CacheStore, CacheStoreExt};
use crate::fetcher::key_locks::KeyLocks;
use crate::fetcher::progress::{ProgressCallback, ProgressReporter};
use crate::forecast::client::OpenMeteoClient;
use crate::grid::{GridKey, LatLon};
use crate::types::weather_record::WeatherRecord;
use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Default cap on concurrent archive requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// The result of one grid fetch.
#[derive(Debug, Clone, Default)]
pub struct GridFetch {
    /// Data per rounded point, from the cache or the network. Points without
    /// data are absent.
    pub records: HashMap<GridKey, WeatherRecord>,
    /// Rounded points for which no data could be obtained.
    pub failed: Vec<GridKey>,
    /// Points fetched successfully whose cache write failed. They are still
    /// present in `records`.
    pub unsaved: Vec<GridKey>,
    /// Set when the fetch was stopped through its cancellation token before
    /// every point completed.
    pub cancelled: bool,
}

impl GridFetch {
    pub fn get(&self, location: LatLon) -> Option<&WeatherRecord> {
        self.records.get(&location.rounded())
    }

    fn absorb(&mut self, outcome: PointOutcome) {
        match outcome {
            PointOutcome::Cached(key, record) => {
                self.failed.retain(|failed| *failed != key);
                self.records.insert(key, record);
            }
            PointOutcome::Fetched { key, record, saved } => {
                self.failed.retain(|failed| *failed != key);
                if !saved {
                    self.unsaved.push(key);
                }
                self.records.insert(key, record);
            }
            PointOutcome::Failed(key) => {
                if !self.records.contains_key(&key) && !self.failed.contains(&key) {
                    self.failed.push(key);
                }
            }
        }
    }
}

enum PointOutcome {
    Cached(GridKey, WeatherRecord),
    Fetched {
        key: GridKey,
        record: WeatherRecord,
        saved: bool,
    },
    Failed(GridKey),
}

pub struct GridFetcher {
    cache: Arc<dyn CacheStore>,
    client: OpenMeteoClient,
    locks: KeyLocks,
}

impl GridFetcher {
    pub fn new(cache: Arc<dyn CacheStore>, client: OpenMeteoClient) -> Self {
        Self {
            cache,
            client,
            locks: KeyLocks::new(),
        }
    }

    /// Resolves every point in `points` for the archive `date`.
    ///
    /// `progress` is invoked once per point, hit or miss, with the fraction
    /// completed so far; the last call is exactly `1.0`. Cancelling
    /// `cancellation` drops all outstanding requests and returns what was
    /// gathered so far with [`GridFetch::cancelled`] set. Cache writes are
    /// atomic, so cancellation never leaves a partial entry behind.
    pub async fn fetch(
        &self,
        points: &[LatLon],
        date: NaiveDate,
        max_in_flight: usize,
        progress: Option<ProgressCallback>,
        cancellation: CancellationToken,
    ) -> GridFetch {
        let mut reporter = ProgressReporter::new(points.len(), progress);
        let mut result = GridFetch::default();

        if points.is_empty() {
            reporter.finish_empty();
            return result;
        }

        info!(
            "Fetching {} grid points for {} ({} in flight)",
            points.len(),
            date,
            max_in_flight.max(1)
        );

        // Keys whose request failed during this fetch; duplicates skip the network.
        let failed_keys = Mutex::new(HashSet::new());
        {
            let mut pending = pin!(stream::iter(points.iter().copied())
                .map(|point| self.resolve_point(point, date, &failed_keys))
                .buffer_unordered(max_in_flight.max(1)));

            loop {
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => {
                        result.cancelled = true;
                        info!(
                            "Grid fetch cancelled with {} of {} points resolved",
                            result.records.len() + result.failed.len(),
                            points.len()
                        );
                        break;
                    }
                    next = pending.next() => match next {
                        Some(outcome) => {
                            result.absorb(outcome);
                            reporter.point_done();
                        }
                        None => break,
                    }
                }
            }
        } // Outstanding requests and their key guards are dropped here.

        self.locks.prune();
        info!(
            "Grid fetch finished: {} points with data, {} failed",
            result.records.len(),
            result.failed.len()
        );
        result
    }

    async fn resolve_point(
        &self,
        point: LatLon,
        date: NaiveDate,
        failed_keys: &Mutex<HashSet<GridKey>>,
    ) -> PointOutcome {
        let key = point.rounded();
        let cache_key = CacheKey::for_location(key.latitude.0, key.longitude.0);
        let _guard = self.locks.lock(&cache_key).await;

        if lock_failed_keys(failed_keys).contains(&key) {
            debug!("Grid point {} already failed in this fetch", key);
            return PointOutcome::Failed(key);
        }

        match self.cache.load::<WeatherRecord>(&cache_key) {
            Ok(Some(record)) => {
                debug!("Cache hit for grid point {}", key);
                return PointOutcome::Cached(key, record);
            }
            Ok(None) => {}
            // An unreadable entry is refetched and overwritten.
            Err(e) => warn!("Ignoring unreadable cache entry for {}: {}", key, e),
        }

        match self.client.archive(key.lat_lon(), date).await {
            Ok(record) => {
                let saved = match self.cache.save(&cache_key, &record) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to cache grid point {}: {}", key, e);
                        false
                    }
                };
                PointOutcome::Fetched { key, record, saved }
            }
            Err(e) => {
                warn!("No data for grid point {}: {}", key, e);
                lock_failed_keys(failed_keys).insert(key);
                PointOutcome::Failed(key)
            }
        }
    }
}

fn lock_failed_keys(
    failed_keys: &Mutex<HashSet<GridKey>>,
) -> std::sync::MutexGuard<'_, HashSet<GridKey>> {
    failed_keys
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
