//! Provides the `GridClient` for fetching archive data over a lattice of
//! points laid out around a center.
//!
//! This client acts as an intermediate builder, obtained via
//! [`MeteoGrid::grid()`], so the lattice can be described by its center,
//! radius and size instead of passing every point by hand.

use crate::error::MeteoGridError;
use crate::fetcher::grid_fetcher::GridFetch;
use crate::fetcher::progress::ProgressCallback;
use crate::grid::{generate_grid, LatLon};
use crate::meteogrid::MeteoGrid;
use crate::user_config::UserConfig;
use bon::bon;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

/// A client builder for grid requests.
///
/// Instances are created by calling [`MeteoGrid::grid()`]. Calling
/// `.around(center)...call()` or `.saved()...call()` lays out the lattice and
/// runs the fetch.
pub struct GridClient<'a> {
    client: &'a MeteoGrid,
}

#[bon]
impl<'a> GridClient<'a> {
    pub(crate) fn new(client: &'a MeteoGrid) -> Self {
        Self { client }
    }

    /// Fetches a `points` x `points` lattice spanning `radius_km` either side
    /// of `center`.
    ///
    /// # Required Builder Methods
    ///
    /// * `.radius_km(f64)`: half-width of the lattice in kilometres.
    /// * `.points(usize)`: points per axis.
    ///
    /// # Optional Builder Methods
    ///
    /// `.on_progress`, `.cancellation`, `.max_in_flight` and `.date` behave as
    /// on [`MeteoGrid::fetch_grid`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use meteogrid::{LatLon, MeteoGrid, MeteoGridError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), MeteoGridError> {
    /// let client = MeteoGrid::new()?;
    /// let result = client
    ///     .grid()
    ///     .around(LatLon(52.37, 4.90))
    ///     .radius_km(20.0)
    ///     .points(4)
    ///     .call()
    ///     .await;
    /// for (key, record) in &result.records {
    ///     println!("{key}: {} hourly rows", record.hourly_rows().len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = around)]
    #[doc(hidden)]
    pub async fn build_around(
        &self,
        #[builder(start_fn)] center: LatLon,
        radius_km: f64,
        points: usize,
        on_progress: Option<ProgressCallback>,
        cancellation: Option<CancellationToken>,
        max_in_flight: Option<usize>,
        date: Option<NaiveDate>,
    ) -> GridFetch {
        let lattice = generate_grid(center, radius_km, points);
        self.client
            .fetch_grid()
            .points(&lattice)
            .maybe_on_progress(on_progress)
            .maybe_cancellation(cancellation)
            .maybe_max_in_flight(max_in_flight)
            .maybe_date(date)
            .call()
            .await
    }

    /// Fetches the lattice described by the saved [`UserConfig`], falling
    /// back to the default configuration when none is saved.
    ///
    /// Takes the same optional builder methods as `.around()`.
    ///
    /// # Errors
    ///
    /// Returns [`MeteoGridError`] only when the saved configuration cannot be
    /// read. Per-point failures end up in [`GridFetch::failed`].
    #[builder(start_fn = saved)]
    #[doc(hidden)]
    pub async fn build_saved(
        &self,
        on_progress: Option<ProgressCallback>,
        cancellation: Option<CancellationToken>,
        max_in_flight: Option<usize>,
        date: Option<NaiveDate>,
    ) -> Result<GridFetch, MeteoGridError> {
        let config: UserConfig = self.client.resolve_config()?;
        Ok(self
            .around(config.center())
            .radius_km(config.radius_km)
            .points(config.num_points)
            .maybe_on_progress(on_progress)
            .maybe_cancellation(cancellation)
            .maybe_max_in_flight(max_in_flight)
            .maybe_date(date)
            .call()
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{CacheStore, MemoryCache};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn archive_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hourly": {"time": ["2024-04-29T00:00"], "temperature_2m": [18.0]},
                "daily": {"time": ["2024-04-29"], "rain_sum": [0.0]}
            })))
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer, cache: Arc<dyn CacheStore>) -> MeteoGrid {
        MeteoGrid::configured()
            .cache(cache)
            .archive_url(format!("{}/v1/era5", server.uri()))
            .call()
            .unwrap()
    }

    #[tokio::test]
    async fn test_around_fetches_every_distinct_point() {
        let server = archive_server().await;
        let client = client_for(&server, Arc::new(MemoryCache::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |f| sink.lock().unwrap().push(f));

        let result = client
            .grid()
            .around(LatLon(52.0, 4.0))
            .radius_km(55.5)
            .points(3)
            .on_progress(callback)
            .date(NaiveDate::from_ymd_opt(2024, 4, 29).unwrap())
            .call()
            .await;

        // 0.5 degree spacing keeps all nine points distinct after rounding.
        assert_eq!(result.records.len(), 9);
        assert!(result.failed.is_empty());
        assert!(!result.cancelled);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn test_saved_uses_stored_config() -> Result<(), MeteoGridError> {
        let server = archive_server().await;
        let client = client_for(&server, Arc::new(MemoryCache::new()));
        client.save_config(&UserConfig {
            latitude: 10.0,
            longitude: 20.0,
            radius_km: 111.0,
            num_points: 2,
        })?;

        let result = client.grid().saved().call().await?;

        assert_eq!(result.records.len(), 4);
        assert!(result.get(LatLon(9.0, 19.0)).is_some());
        assert!(result.get(LatLon(11.0, 21.0)).is_some());
        Ok(())
    }
}
