use crate::forecast::error::FetchError;
use crate::grid::LatLon;
use crate::types::variables::{join_api_names, DailyVariable, HourlyVariable};
use crate::types::weather_record::WeatherRecord;
use chrono::{Days, Local, NaiveDate};
use log::{info, warn};
use reqwest::Client;
use std::time::Duration;

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/era5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How far back the archive request looks. The reanalysis lags real time,
/// so "two days ago" is the most recent date reliably available.
const ARCHIVE_LAG_DAYS: u64 = 2;

/// The archive date used for a grid fetch started on `today`.
pub fn archive_date_for(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(ARCHIVE_LAG_DAYS))
        .unwrap_or(today)
}

/// The archive date for a fetch started now, in the caller's local calendar.
pub fn default_archive_date() -> NaiveDate {
    archive_date_for(Local::now().date_naive())
}

/// HTTP access to the Open-Meteo forecast and ERA5 archive endpoints.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    forecast_url: String,
    archive_url: String,
}

impl OpenMeteoClient {
    pub fn new(
        forecast_url: impl Into<String>,
        archive_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            forecast_url: forecast_url.into(),
            archive_url: archive_url.into(),
        })
    }

    /// Near-term hourly and daily forecast for one location.
    ///
    /// # Errors
    ///
    /// [`FetchError::NetworkRequest`] / [`FetchError::HttpStatus`] when the
    /// request fails or the status is not a success, [`FetchError::Decode`]
    /// when the body is not a forecast, and [`FetchError::MissingField`] when
    /// the hourly or daily block is absent.
    pub async fn forecast(&self, location: LatLon) -> Result<WeatherRecord, FetchError> {
        let query = [
            ("latitude", location.0.to_string()),
            ("longitude", location.1.to_string()),
            ("hourly", join_api_names(&HourlyVariable::ALL)),
            ("daily", join_api_names(&DailyVariable::FORECAST)),
            ("timezone", "auto".to_string()),
        ];
        info!("Fetching forecast for ({}, {})", location.0, location.1);
        let record = self.get_record(&self.forecast_url, &query).await?;

        if record.hourly.is_none() {
            return Err(missing(location, "hourly"));
        }
        if record.daily.is_none() {
            return Err(missing(location, "daily"));
        }
        Ok(record)
    }

    /// Hourly reanalysis plus daily rain sum for one location on one past date.
    ///
    /// A response without an hourly temperature series is rejected with
    /// [`FetchError::MissingField`].
    pub async fn archive(
        &self,
        location: LatLon,
        date: NaiveDate,
    ) -> Result<WeatherRecord, FetchError> {
        let date = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", location.0.to_string()),
            ("longitude", location.1.to_string()),
            ("start_date", date.clone()),
            ("end_date", date),
            ("hourly", join_api_names(&HourlyVariable::ALL)),
            ("daily", join_api_names(&DailyVariable::ARCHIVE)),
            ("timezone", "auto".to_string()),
        ];
        let record = self.get_record(&self.archive_url, &query).await?;

        if !record.has_hourly_temperature() {
            return Err(missing(location, "hourly.temperature_2m"));
        }
        Ok(record)
    }

    async fn get_record(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<WeatherRecord, FetchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

fn missing(location: LatLon, field: &'static str) -> FetchError {
    FetchError::MissingField {
        lat: location.0,
        lon: location.1,
        field,
    }
}
