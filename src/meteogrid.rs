//! This module provides the main entry point of the crate. A [`MeteoGrid`]
//! owns the cache and the HTTP client and exposes the single-location
//! forecast, the concurrent grid fetch and the saved user configuration.

use crate::cache::file_cache::{FileCache, DEFAULT_CACHE_DIR};
use crate::cache::key::{CacheKey, KeyPart};
use crate::cache::store::{CacheStore, CacheStoreExt};
use crate::clients::grid_client::GridClient;
use crate::error::MeteoGridError;
use crate::fetcher::grid_fetcher::{GridFetch, GridFetcher, DEFAULT_MAX_IN_FLIGHT};
use crate::fetcher::progress::ProgressCallback;
use crate::forecast::client::{
    default_archive_date, OpenMeteoClient, ARCHIVE_URL, DEFAULT_TIMEOUT, FORECAST_URL,
};
use crate::grid::LatLon;
use crate::types::weather_record::WeatherRecord;
use crate::user_config::{self, UserConfig};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::NaiveDate;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Forecast entries are namespaced so they never share a file with the
/// archive entry of a grid point at the same coordinates.
const FORECAST_KEY_PREFIX: &str = "forecast";

/// The main client struct.
///
/// Construct it once at startup and share it; every component that caches
/// goes through the one [`CacheStore`] it was built with.
///
/// # Examples
///
/// ```no_run
/// # use meteogrid::{MeteoGrid, MeteoGridError, LatLon};
/// # #[tokio::main]
/// # async fn main() -> Result<(), MeteoGridError> {
/// let client = MeteoGrid::new()?;
/// let forecast = client.forecast(LatLon(21.0285, 105.8542)).await?;
/// for row in forecast.hourly_rows().iter().take(3) {
///     println!("{} {:?}", row.time, row.temperature_2m);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MeteoGrid {
    cache: Arc<dyn CacheStore>,
    client: OpenMeteoClient,
    grid_fetcher: GridFetcher,
    max_in_flight: usize,
}

#[bon]
impl MeteoGrid {
    /// Creates a client caching into `.cache` under the working directory,
    /// talking to the public Open-Meteo endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`MeteoGridError::Cache`] if the cache directory cannot be
    /// created and [`MeteoGridError::HttpClient`] if the HTTP client cannot be
    /// initialised.
    pub fn new() -> Result<Self, MeteoGridError> {
        Self::with_cache_folder(PathBuf::from(DEFAULT_CACHE_DIR))
    }

    /// Creates a client caching into the per-user cache directory
    /// (e.g. `~/.cache/meteogrid_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`MeteoGridError::CacheDirResolution`] if the platform has no
    /// cache directory, otherwise as [`MeteoGrid::new`].
    pub fn in_user_cache_dir() -> Result<Self, MeteoGridError> {
        let cache_folder = get_cache_dir().ok_or(MeteoGridError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder)
    }

    /// Creates a client with a file cache rooted at `cache_folder`. The
    /// directory is created if it doesn't exist.
    pub fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, MeteoGridError> {
        Self::configured().cache_folder(cache_folder).call()
    }

    /// Creates a client with every setting spelled out. Unset settings take
    /// their defaults.
    ///
    /// * `.cache(Arc<dyn CacheStore>)`: use this store instead of a file cache.
    /// * `.cache_folder(PathBuf)`: root of the file cache. Defaults to `.cache`.
    ///   Ignored when `.cache` is given.
    /// * `.forecast_url(..)` / `.archive_url(..)`: endpoint overrides.
    /// * `.timeout(Duration)`: per-request timeout. Defaults to 10 seconds.
    /// * `.max_in_flight(usize)`: default cap on concurrent grid requests.
    ///   Defaults to 8.
    ///
    /// # Examples
    ///
    /// ```
    /// # use meteogrid::{MeteoGrid, MeteoGridError, MemoryCache};
    /// # use std::sync::Arc;
    /// # use std::time::Duration;
    /// # fn main() -> Result<(), MeteoGridError> {
    /// let client = MeteoGrid::configured()
    ///     .cache(Arc::new(MemoryCache::new()))
    ///     .timeout(Duration::from_secs(3))
    ///     .max_in_flight(4)
    ///     .call()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn configured(
        cache: Option<Arc<dyn CacheStore>>,
        cache_folder: Option<PathBuf>,
        #[builder(into)] forecast_url: Option<String>,
        #[builder(into)] archive_url: Option<String>,
        timeout: Option<Duration>,
        max_in_flight: Option<usize>,
    ) -> Result<Self, MeteoGridError> {
        let cache = match cache {
            Some(cache) => cache,
            None => {
                let cache_folder =
                    cache_folder.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
                ensure_cache_dir_exists(&cache_folder)?;
                info!("Using cache directory {}", cache_folder.display());
                Arc::new(FileCache::new(cache_folder)) as Arc<dyn CacheStore>
            }
        };
        let client = OpenMeteoClient::new(
            forecast_url.unwrap_or_else(|| FORECAST_URL.to_string()),
            archive_url.unwrap_or_else(|| ARCHIVE_URL.to_string()),
            timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
        .map_err(MeteoGridError::HttpClient)?;

        Ok(Self {
            grid_fetcher: GridFetcher::new(Arc::clone(&cache), client.clone()),
            cache,
            client,
            max_in_flight: max_in_flight.unwrap_or(DEFAULT_MAX_IN_FLIGHT).max(1),
        })
    }

    /// The store every component of this client caches into.
    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Fetches the current forecast for one location, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`MeteoGridError::Fetch`] when the request fails, the status is
    /// not a success, or the response lacks the hourly or daily block. The
    /// caller decides how to surface it; nothing is swallowed here.
    pub async fn fetch_point(&self, location: LatLon) -> Result<WeatherRecord, MeteoGridError> {
        Ok(self.client.forecast(location).await?)
    }

    /// The forecast for one location, served from the cache when present and
    /// fetched then cached otherwise.
    ///
    /// # Errors
    ///
    /// As [`MeteoGrid::fetch_point`], plus [`MeteoGridError::Cache`] when the
    /// cached entry is unreadable or the new entry cannot be written.
    pub async fn forecast(&self, location: LatLon) -> Result<WeatherRecord, MeteoGridError> {
        let key = forecast_key(location);
        if let Some(record) = self.cache.load::<WeatherRecord>(&key)? {
            info!("Returning cached forecast for {}", key);
            return Ok(record);
        }
        let record = self.fetch_point(location).await?;
        self.cache.save(&key, &record)?;
        Ok(record)
    }

    /// Drops the cached forecast for `location`, if any.
    pub fn clear_forecast(&self, location: LatLon) -> Result<(), MeteoGridError> {
        Ok(self.cache.invalidate(&forecast_key(location))?)
    }

    /// Fetches archive data for every point, concurrently, through the cache.
    ///
    /// Points are rounded to one decimal place; points that round together
    /// share one request and one cache entry. Failures are logged and the
    /// point is left out of [`GridFetch::records`].
    ///
    /// * `.points(&[LatLon])`: **Required.**
    /// * `.on_progress(ProgressCallback)`: called once per point with the
    ///   fraction done, ending at exactly `1.0`.
    /// * `.cancellation(CancellationToken)`: cancel to stop early.
    /// * `.max_in_flight(usize)`: overrides the client's concurrency cap.
    /// * `.date(NaiveDate)`: archive date. Defaults to two days before today,
    ///   local time.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use meteogrid::{generate_grid, LatLon, MeteoGrid, MeteoGridError};
    /// # use std::sync::Arc;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), MeteoGridError> {
    /// let client = MeteoGrid::new()?;
    /// let points = generate_grid(LatLon(21.0285, 105.8542), 25.0, 5);
    /// let result = client
    ///     .fetch_grid()
    ///     .points(&points)
    ///     .on_progress(Arc::new(|done: f64| println!("{:.0}%", done * 100.0)))
    ///     .call()
    ///     .await;
    /// println!("{} of {} points have data", result.records.len(), points.len());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn fetch_grid(
        &self,
        points: &[LatLon],
        on_progress: Option<ProgressCallback>,
        cancellation: Option<CancellationToken>,
        max_in_flight: Option<usize>,
        date: Option<NaiveDate>,
    ) -> GridFetch {
        self.grid_fetcher
            .fetch(
                points,
                date.unwrap_or_else(default_archive_date),
                max_in_flight.unwrap_or(self.max_in_flight),
                on_progress,
                cancellation.unwrap_or_default(),
            )
            .await
    }

    /// Starts a grid request built around a center point.
    /// See [`GridClient`].
    pub fn grid(&self) -> GridClient<'_> {
        GridClient::new(self)
    }

    /// Overwrites the saved location and grid parameters.
    pub fn save_config(&self, config: &UserConfig) -> Result<(), MeteoGridError> {
        Ok(user_config::save_config(self.cache.as_ref(), config)?)
    }

    /// The saved location and grid parameters, `None` if nothing was saved.
    pub fn load_config(&self) -> Result<Option<UserConfig>, MeteoGridError> {
        user_config::load_config(self.cache.as_ref())
    }

    /// The saved configuration, or [`UserConfig::default`] when there is none.
    pub fn resolve_config(&self) -> Result<UserConfig, MeteoGridError> {
        Ok(self.load_config()?.unwrap_or_default())
    }
}

fn forecast_key(location: LatLon) -> CacheKey {
    CacheKey::new([
        KeyPart::from(FORECAST_KEY_PREFIX),
        KeyPart::from(location.0),
        KeyPart::from(location.1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryCache;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, cache: Arc<dyn CacheStore>) -> MeteoGrid {
        MeteoGrid::configured()
            .cache(cache)
            .forecast_url(format!("{}/v1/forecast", server.uri()))
            .archive_url(format!("{}/v1/era5", server.uri()))
            .call()
            .unwrap()
    }

    fn forecast_body() -> serde_json::Value {
        json!({
            "timezone": "Asia/Bangkok",
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
                "temperature_2m": [27.4, 27.0],
                "windspeed_10m": [6.1, 5.8],
                "winddirection_10m": [140.0, 150.0]
            },
            "daily": {
                "time": ["2024-05-01"],
                "temperature_2m_max": [34.0],
                "temperature_2m_min": [25.5],
                "windspeed_10m_max": [14.2]
            }
        })
    }

    #[test]
    fn test_with_cache_folder_creates_directory() -> Result<(), MeteoGridError> {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("cache");
        let client = MeteoGrid::with_cache_folder(folder.clone())?;
        assert!(folder.is_dir());
        assert_eq!(client.load_config()?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_forecast_is_cached_until_cleared() -> Result<(), MeteoGridError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryCache::new()));
        let location = LatLon(21.0285, 105.8542);

        let first = client.forecast(location).await?;
        let second = client.forecast(location).await?;
        assert_eq!(first, second);

        client.clear_forecast(location)?;
        client.forecast(location).await?;
        server.verify().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_forecast_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = Arc::new(MemoryCache::new());
        let client = client_for(&server, cache.clone());
        let result = client.forecast(LatLon(1.0, 1.0)).await;

        assert!(matches!(result, Err(MeteoGridError::Fetch(e)) if e.is_network()));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_forecast_and_grid_entries_do_not_collide() -> Result<(), MeteoGridError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hourly": {"time": ["2024-04-29T00:00"], "temperature_2m": [24.0]},
                "daily": {"time": ["2024-04-29"], "rain_sum": [1.5]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(MemoryCache::new());
        let client = client_for(&server, cache.clone());
        let location = LatLon(21.0, 105.9);

        client.forecast(location).await?;
        let grid = client.fetch_grid().points(&[location]).call().await;

        assert_eq!(cache.len(), 2);
        let archived = grid.get(location).unwrap();
        assert_eq!(archived.daily_rows()[0].rain_sum, Some(1.5));
        Ok(())
    }

    #[tokio::test]
    async fn test_config_round_trip_and_default() -> Result<(), MeteoGridError> {
        let server = MockServer::start().await;
        let client = client_for(&server, Arc::new(MemoryCache::new()));

        assert_eq!(client.load_config()?, None);
        assert_eq!(client.resolve_config()?, UserConfig::default());

        let config = UserConfig {
            latitude: 48.8566,
            longitude: 2.3522,
            radius_km: 30.0,
            num_points: 4,
        };
        client.save_config(&config)?;
        assert_eq!(client.load_config()?, Some(config));
        assert_eq!(client.resolve_config()?, config);
        Ok(())
    }
}
