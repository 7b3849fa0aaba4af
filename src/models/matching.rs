use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::distance::DistanceSource;
use crate::models::place::GeoPoint;
use crate::models::pool::Role;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedPassenger {
    pub passenger_id: String,
    pub name: Option<String>,
    pub pickup_location: GeoPoint,
    pub pickup_address: Option<String>,
    pub destination: String,
    pub distance_km: f64,
    pub duration: String,
    pub distance_source: DistanceSource,
    pub pickup_eta_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub driver_id: String,
    pub driver_name: Option<String>,
    pub driver_location: GeoPoint,
    pub pickup_address: Option<String>,
    pub destination: String,
    pub available_seats: u32,
    pub price_per_seat: Option<f64>,
    pub assigned_passengers: Vec<AssignedPassenger>,
}

impl Match {
    pub fn seats_left(&self) -> u32 {
        self.available_seats
            .saturating_sub(self.assigned_passengers.len() as u32)
    }

    pub fn passenger(&self, user_id: &str) -> Option<&AssignedPassenger> {
        self.assigned_passengers
            .iter()
            .find(|passenger| passenger.passenger_id == user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchStats {
    pub pool_size: usize,
    pub inactive_dropped: usize,
    pub duplicates_dropped: usize,
    pub defects_dropped: usize,
    pub drivers: usize,
    pub passengers: usize,
    pub matched_passengers: usize,
}

/// Outcome of one matching run over a pool snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRun {
    pub matches: Vec<Match>,
    pub total_matches: usize,
    pub max_distance_km: f64,
    pub stats: MatchStats,
    pub generated_at: DateTime<Utc>,
}

/// A match seen from one participant's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMatch {
    pub role: Role,
    #[serde(rename = "match")]
    pub trip: Match,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_details: Option<AssignedPassenger>,
}

/// Every match in `matches` where `user_id` drives or rides.
pub fn matches_for_user(matches: &[Match], user_id: &str) -> Vec<UserMatch> {
    let user_id = user_id.trim();
    let mut found = Vec::new();

    for trip in matches {
        if trip.driver_id == user_id {
            found.push(UserMatch {
                role: Role::Driver,
                trip: trip.clone(),
                passenger_details: None,
            });
        }

        if let Some(passenger) = trip.passenger(user_id) {
            found.push(UserMatch {
                role: Role::Passenger,
                trip: trip.clone(),
                passenger_details: Some(passenger.clone()),
            });
        }
    }

    found
}
