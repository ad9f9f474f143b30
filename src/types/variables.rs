//! Defines the Open-Meteo series requested by this crate and their wire names.

use std::fmt;

/// An hourly series requested from the forecast and archive endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HourlyVariable {
    /// Air temperature at 2 metres, in °C.
    Temperature2m,
    /// Wind speed at 10 metres, in km/h.
    WindSpeed10m,
    /// Wind direction at 10 metres, in degrees.
    WindDirection10m,
}

impl HourlyVariable {
    pub const ALL: [HourlyVariable; 3] = [
        HourlyVariable::Temperature2m,
        HourlyVariable::WindSpeed10m,
        HourlyVariable::WindDirection10m,
    ];

    pub fn api_name(&self) -> &'static str {
        match self {
            HourlyVariable::Temperature2m => "temperature_2m",
            HourlyVariable::WindSpeed10m => "windspeed_10m",
            HourlyVariable::WindDirection10m => "winddirection_10m",
        }
    }
}

impl fmt::Display for HourlyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// A daily aggregate requested from the forecast or archive endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyVariable {
    Temperature2mMax,
    Temperature2mMin,
    WindSpeed10mMax,
    /// Only requested from the archive endpoint.
    RainSum,
}

impl DailyVariable {
    /// The daily series the forecast endpoint is asked for.
    pub const FORECAST: [DailyVariable; 3] = [
        DailyVariable::Temperature2mMax,
        DailyVariable::Temperature2mMin,
        DailyVariable::WindSpeed10mMax,
    ];

    /// The daily series the archive endpoint is asked for.
    pub const ARCHIVE: [DailyVariable; 1] = [DailyVariable::RainSum];

    pub fn api_name(&self) -> &'static str {
        match self {
            DailyVariable::Temperature2mMax => "temperature_2m_max",
            DailyVariable::Temperature2mMin => "temperature_2m_min",
            DailyVariable::WindSpeed10mMax => "windspeed_10m_max",
            DailyVariable::RainSum => "rain_sum",
        }
    }
}

impl fmt::Display for DailyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Comma-joins the wire names, as the `hourly` and `daily` query parameters expect.
pub(crate) fn join_api_names<V: fmt::Display>(variables: &[V]) -> String {
    variables
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
