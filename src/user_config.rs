//! Persistence of the last-used location and grid parameters.
//!
//! The configuration is a single cache entry under a fixed key. It is stored
//! inside a versioned envelope so a future change of shape can be detected
//! instead of silently misread. The flat, unversioned object written by
//! earlier releases is still accepted.

use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use crate::cache::store::{CacheStore, CacheStoreExt};
use crate::error::MeteoGridError;
use crate::grid::{generate_grid, LatLon};
use serde::{Deserialize, Serialize};

const CONFIG_KEY: &str = "user_config";

/// The stored shape this release reads and writes.
pub const CONFIG_VERSION: u32 = 1;

/// The location and grid the user last asked for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub num_points: usize,
}

impl Default for UserConfig {
    /// Central Hanoi, a one kilometre radius and a 5 x 5 grid.
    fn default() -> Self {
        Self {
            latitude: 21.0285,
            longitude: 105.8542,
            radius_km: 1.0,
            num_points: 5,
        }
    }
}

impl UserConfig {
    pub fn center(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// The lattice these parameters describe.
    pub fn grid(&self) -> Vec<LatLon> {
        generate_grid(self.center(), self.radius_km, self.num_points)
    }
}

#[derive(Serialize)]
struct VersionedRef<'a> {
    version: u32,
    config: &'a UserConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredConfig {
    Versioned { version: u32, config: UserConfig },
    Legacy(UserConfig),
}

fn config_key() -> CacheKey {
    CacheKey::new([CONFIG_KEY])
}

/// Overwrites the stored configuration.
pub fn save_config(cache: &dyn CacheStore, config: &UserConfig) -> Result<(), CacheError> {
    cache.save(
        &config_key(),
        &VersionedRef {
            version: CONFIG_VERSION,
            config,
        },
    )
}

/// Reads the stored configuration, `Ok(None)` when nothing was saved yet.
///
/// # Errors
///
/// Fails when the entry cannot be read or decoded, or when it was written
/// with a version this release does not understand.
pub fn load_config(cache: &dyn CacheStore) -> Result<Option<UserConfig>, MeteoGridError> {
    let Some(stored) = cache.load::<StoredConfig>(&config_key())? else {
        return Ok(None);
    };
    match stored {
        StoredConfig::Versioned { version, config } if version == CONFIG_VERSION => {
            Ok(Some(config))
        }
        StoredConfig::Versioned { version, .. } => Err(MeteoGridError::UnsupportedConfigVersion {
            found: version,
            expected: CONFIG_VERSION,
        }),
        StoredConfig::Legacy(config) => Ok(Some(config)),
    }
}
