use dashmap::DashMap;

use crate::models::distance::{DistanceResult, TravelMode};
use crate::models::place::Place;

/// Coordinates are bucketed to 5 decimals (about 1 m) before keying.
const COORD_SCALE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PlaceKey {
    Point(i64, i64),
    Address(String),
}

impl From<&Place> for PlaceKey {
    fn from(place: &Place) -> Self {
        match place {
            Place::Point(point) => PlaceKey::Point(
                (point.lat * COORD_SCALE).round() as i64,
                (point.lng * COORD_SCALE).round() as i64,
            ),
            Place::Address(address) => PlaceKey::Address(address.trim().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    origin: PlaceKey,
    destination: PlaceKey,
    mode: TravelMode,
}

impl CacheKey {
    pub fn new(origin: &Place, destination: &Place, mode: TravelMode) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode,
        }
    }
}

/// Memoized live lookups. Directional: A->B and B->A are separate entries.
#[derive(Debug, Default)]
pub struct DistanceCache {
    entries: DashMap<CacheKey, DistanceResult>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<DistanceResult> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: CacheKey, result: DistanceResult) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
