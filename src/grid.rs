//! Rectangular lattices of coordinates around a center point.
//!
//! Distances are converted to degrees with the flat approximation
//! 1 degree = 111 km on both axes. This is not geodesically exact (a degree
//! of longitude shrinks with latitude) but is good enough for laying out a
//! visualization grid a few kilometres wide.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilometres per degree used for the radius conversion.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use meteogrid::LatLon;
///
/// let hanoi = LatLon(21.0285, 105.8542);
/// assert_eq!(hanoi.0, 21.0285); // Latitude
/// assert_eq!(hanoi.1, 105.8542); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Both coordinates rounded to one decimal place.
    pub fn rounded(&self) -> GridKey {
        GridKey::new(round_coordinate(self.0), round_coordinate(self.1))
    }
}

/// A rounded, hashable coordinate pair identifying one grid entry.
///
/// Nearby points that round to the same tenth of a degree share a key, and
/// with it a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub latitude: OrderedFloat<f64>,
    pub longitude: OrderedFloat<f64>,
}

impl GridKey {
    fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: OrderedFloat(latitude),
            longitude: OrderedFloat(longitude),
        }
    }

    pub fn lat_lon(&self) -> LatLon {
        LatLon(self.latitude.0, self.longitude.0)
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Rounds to one decimal place. `-0.0` becomes `0.0`.
///
/// Rounding goes through the correctly rounded decimal rendering, so a value
/// like `0.15` (stored as `0.1499..`) becomes `0.1` and exact ties go to the
/// even digit. Entries written by earlier releases keep their file names.
pub fn round_coordinate(value: f64) -> f64 {
    let rounded = format!("{value:.1}").parse::<f64>().unwrap_or(value);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `count` evenly spaced values over `[start, end]`, both ends included.
///
/// A single value is the midpoint of the range.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Builds a `num_points` x `num_points` lattice around `center`.
///
/// Latitudes are the outer loop and longitudes the inner one, so the result
/// reads row by row from the southern edge.
///
/// # Examples
///
/// ```
/// use meteogrid::{generate_grid, LatLon};
///
/// let grid = generate_grid(LatLon(21.0, 105.8), 11.1, 3);
/// assert_eq!(grid.len(), 9);
/// assert_eq!(grid[4].rounded().lat_lon(), LatLon(21.0, 105.8));
///
/// assert_eq!(generate_grid(LatLon(21.0, 105.8), 11.1, 1), vec![LatLon(21.0, 105.8)]);
/// ```
pub fn generate_grid(center: LatLon, radius_km: f64, num_points: usize) -> Vec<LatLon> {
    if num_points == 1 {
        return vec![center];
    }
    let radius_deg = radius_km / KM_PER_DEGREE;
    let latitudes = linspace(center.0 - radius_deg, center.0 + radius_deg, num_points);
    let longitudes = linspace(center.1 - radius_deg, center.1 + radius_deg, num_points);

    latitudes
        .iter()
        .flat_map(|&lat| longitudes.iter().map(move |&lon| LatLon(lat, lon)))
        .collect()
}
