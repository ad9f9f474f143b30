mod animation;
mod cache;
mod clients;
mod error;
mod fetcher;
mod forecast;
mod grid;
mod meteogrid;
mod types;
mod user_config;
mod utils;

pub use error::MeteoGridError;
pub use meteogrid::*;

pub use clients::grid_client::*;

pub use animation::{Animation, PlaybackState, DEFAULT_FPS, MAX_FPS, MIN_FPS};
pub use grid::{generate_grid, linspace, round_coordinate, GridKey, LatLon, KM_PER_DEGREE};
pub use user_config::{UserConfig, CONFIG_VERSION};

pub use cache::error::CacheError;
pub use cache::file_cache::{FileCache, DEFAULT_CACHE_DIR};
pub use cache::key::{CacheKey, KeyPart};
pub use cache::store::{CacheStore, CacheStoreExt, MemoryCache};

pub use fetcher::grid_fetcher::{GridFetch, DEFAULT_MAX_IN_FLIGHT};
pub use fetcher::progress::ProgressCallback;

pub use forecast::client::{
    archive_date_for, default_archive_date, OpenMeteoClient, ARCHIVE_URL, DEFAULT_TIMEOUT,
    FORECAST_URL,
};
pub use forecast::error::FetchError;

pub use types::variables::{DailyVariable, HourlyVariable};
pub use types::weather_record::{DailyRow, DailySeries, HourlyRow, HourlySeries, WeatherRecord};
