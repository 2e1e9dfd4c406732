//! Geographic coordinates and axis-aligned bounding boxes.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A rectangle given by its two corners, in degrees.
///
/// No range checks are made: whatever the caller passes in is kept as is.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl Bounds {
    pub fn new(min: LatLon, max: LatLon) -> Self {
        Self { min, max }
    }

    pub fn from_corners(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self::new(LatLon::new(lat1, lon1), LatLon::new(lat2, lon2))
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min.lat + self.max.lat) / 2.0,
            (self.min.lon + self.max.lon) / 2.0,
        )
    }

    /// The `bbox` query value used by the OSM API: `minlon,minlat,maxlon,maxlat`.
    pub fn to_bbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min.lon, self.min.lat, self.max.lon, self.max.lat
        )
    }
}

/// Renders as `minlat,minlon,maxlat,maxlon`, the same shape `--download` accepts.
impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min.lat, self.min.lon, self.max.lat, self.max.lon
        )
    }
}
