use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }
}

/// A stop handed to the distance oracle: either raw coordinates or a free-text
/// address that only a live routing service can resolve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Place {
    Point(GeoPoint),
    Address(String),
}

impl Place {
    pub fn as_point(&self) -> Option<GeoPoint> {
        match self {
            Place::Point(point) => Some(*point),
            Place::Address(_) => None,
        }
    }

    /// Form accepted by distance-matrix style services (`lat,lng` or the address).
    pub fn to_query(&self) -> String {
        match self {
            Place::Point(point) => format!("{},{}", point.lat, point.lng),
            Place::Address(address) => address.trim().to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Place::Point(point) => format!("({:.5}, {:.5})", point.lat, point.lng),
            Place::Address(address) => address.trim().to_string(),
        }
    }
}

impl From<GeoPoint> for Place {
    fn from(point: GeoPoint) -> Self {
        Place::Point(point)
    }
}
