//! Defines the forecast / reanalysis response shape as stored in the cache and
//! handed to the presentation layer.

use crate::types::variables::{DailyVariable, HourlyVariable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One response from the forecast or archive endpoint.
///
/// The series this crate asks for are typed; anything else the provider
/// returns is kept in `extra` so a record survives a trip through the cache
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// IANA name of the timezone the timestamps are expressed in (`timezone=auto`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<HourlySeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailySeries>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Index-aligned hourly arrays. Missing samples are `null` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windspeed_10m: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winddirection_10m: Option<Vec<Option<f64>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Index-aligned daily arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windspeed_10m_max: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_sum: Option<Vec<Option<f64>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One hour of a [`WeatherRecord`], for tabular display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRow<'a> {
    pub time: &'a str,
    pub temperature_2m: Option<f64>,
    pub windspeed_10m: Option<f64>,
    pub winddirection_10m: Option<f64>,
}

/// One day of a [`WeatherRecord`], for tabular display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRow<'a> {
    pub time: &'a str,
    pub temperature_2m_max: Option<f64>,
    pub temperature_2m_min: Option<f64>,
    pub windspeed_10m_max: Option<f64>,
    pub rain_sum: Option<f64>,
}

fn cell(series: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    series.as_ref().and_then(|values| values.get(index).copied().flatten())
}

impl HourlySeries {
    pub fn values(&self, variable: HourlyVariable) -> Option<&[Option<f64>]> {
        match variable {
            HourlyVariable::Temperature2m => self.temperature_2m.as_deref(),
            HourlyVariable::WindSpeed10m => self.windspeed_10m.as_deref(),
            HourlyVariable::WindDirection10m => self.winddirection_10m.as_deref(),
        }
    }
}

impl DailySeries {
    pub fn values(&self, variable: DailyVariable) -> Option<&[Option<f64>]> {
        match variable {
            DailyVariable::Temperature2mMax => self.temperature_2m_max.as_deref(),
            DailyVariable::Temperature2mMin => self.temperature_2m_min.as_deref(),
            DailyVariable::WindSpeed10mMax => self.windspeed_10m_max.as_deref(),
            DailyVariable::RainSum => self.rain_sum.as_deref(),
        }
    }
}

impl WeatherRecord {
    /// Whether the record carries an hourly temperature series, the minimum a
    /// grid entry needs to be drawn.
    pub fn has_hourly_temperature(&self) -> bool {
        self.hourly
            .as_ref()
            .is_some_and(|hourly| hourly.temperature_2m.is_some())
    }

    /// Rows of the hourly table, one per timestamp. Cells past the end of a
    /// shorter series are `None`.
    pub fn hourly_rows(&self) -> Vec<HourlyRow<'_>> {
        let Some(hourly) = &self.hourly else {
            return Vec::new();
        };
        hourly
            .time
            .iter()
            .enumerate()
            .map(|(i, time)| HourlyRow {
                time,
                temperature_2m: cell(&hourly.temperature_2m, i),
                windspeed_10m: cell(&hourly.windspeed_10m, i),
                winddirection_10m: cell(&hourly.winddirection_10m, i),
            })
            .collect()
    }

    /// Rows of the daily table, one per date.
    pub fn daily_rows(&self) -> Vec<DailyRow<'_>> {
        let Some(daily) = &self.daily else {
            return Vec::new();
        };
        daily
            .time
            .iter()
            .enumerate()
            .map(|(i, time)| DailyRow {
                time,
                temperature_2m_max: cell(&daily.temperature_2m_max, i),
                temperature_2m_min: cell(&daily.temperature_2m_min, i),
                windspeed_10m_max: cell(&daily.windspeed_10m_max, i),
                rain_sum: cell(&daily.rain_sum, i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forecast_json() -> Value {
        json!({
            "latitude": 21.0,
            "longitude": 105.875,
            "generationtime_ms": 0.05,
            "timezone": "Asia/Bangkok",
            "hourly_units": {"time": "iso8601", "temperature_2m": "°C"},
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T02:00"],
                "temperature_2m": [27.1, null, 26.4],
                "windspeed_10m": [5.2, 4.9],
                "winddirection_10m": [120.0, 118.0, 115.0]
            },
            "daily": {
                "time": ["2024-05-01"],
                "temperature_2m_max": [34.2],
                "temperature_2m_min": [25.9],
                "windspeed_10m_max": [12.3]
            }
        })
    }

    #[test]
    fn test_record_round_trips_unknown_fields() {
        let raw = forecast_json();
        let record: WeatherRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.timezone.as_deref(), Some("Asia/Bangkok"));
        assert!(record.extra.contains_key("hourly_units"));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_hourly_rows_align_by_index() {
        let record: WeatherRecord = serde_json::from_value(forecast_json()).unwrap();
        let rows = record.hourly_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].time, "2024-05-01T00:00");
        assert_eq!(rows[0].temperature_2m, Some(27.1));
        assert_eq!(rows[1].temperature_2m, None);
        assert_eq!(rows[2].windspeed_10m, None);
        assert_eq!(rows[2].winddirection_10m, Some(115.0));
    }

    #[test]
    fn test_daily_rows() {
        let record: WeatherRecord = serde_json::from_value(forecast_json()).unwrap();
        let rows = record.daily_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temperature_2m_max, Some(34.2));
        assert_eq!(rows[0].rain_sum, None);
        assert_eq!(
            record
                .daily
                .as_ref()
                .and_then(|d| d.values(DailyVariable::WindSpeed10mMax)),
            Some(&[Some(12.3)][..])
        );
    }

    #[test]
    fn test_has_hourly_temperature() {
        let record: WeatherRecord = serde_json::from_value(forecast_json()).unwrap();
        assert!(record.has_hourly_temperature());

        let without: WeatherRecord = serde_json::from_value(json!({
            "hourly": {"time": ["2024-05-01T00:00"], "windspeed_10m": [3.0]}
        }))
        .unwrap();
        assert!(!without.has_hourly_temperature());
        assert!(without.daily_rows().is_empty());
    }
}
