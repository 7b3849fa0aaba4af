use serde::{Deserialize, Serialize};

use crate::geo::round_to;

/// Distance reported for a pair the oracle could not resolve at all.
pub const UNREACHABLE_DISTANCE_KM: f64 = 999.0;

/// Minutes of driving assumed per great-circle kilometre when no live data exists.
pub const ESTIMATED_MINUTES_PER_KM: f64 = 1.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSource {
    Live,
    Estimated,
    Error,
}

impl DistanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceSource::Live => "live",
            DistanceSource::Estimated => "estimated",
            DistanceSource::Error => "error",
        }
    }
}

/// Lookups always request `Driving`. The other modes only keep cache keys apart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
        }
    }
}

/// Raw figures returned by a live routing service before rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMeasurement {
    pub distance_m: u64,
    pub duration_s: u64,
    pub duration_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistanceResult {
    pub distance_km: f64,
    pub distance_m: u64,
    pub duration: String,
    pub duration_s: u64,
    pub source: DistanceSource,
}

impl DistanceResult {
    pub fn live(measurement: LiveMeasurement) -> Self {
        Self {
            distance_km: round_to(measurement.distance_m as f64 / 1000.0, 2),
            distance_m: measurement.distance_m,
            duration: measurement.duration_text,
            duration_s: measurement.duration_s,
            source: DistanceSource::Live,
        }
    }

    pub fn estimated(distance_km: f64) -> Self {
        let distance_km = distance_km.max(0.0);
        let minutes = (distance_km * ESTIMATED_MINUTES_PER_KM).round() as u64;

        Self {
            distance_km: round_to(distance_km, 2),
            distance_m: (distance_km * 1000.0).round() as u64,
            duration: format!("~{minutes} min"),
            duration_s: minutes * 60,
            source: DistanceSource::Estimated,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            distance_km: UNREACHABLE_DISTANCE_KM,
            distance_m: (UNREACHABLE_DISTANCE_KM * 1000.0) as u64,
            duration: "N/A".to_string(),
            duration_s: 0,
            source: DistanceSource::Error,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.source == DistanceSource::Error
    }

    pub fn duration_minutes(&self) -> u64 {
        (self.duration_s as f64 / 60.0).round() as u64
    }
}
