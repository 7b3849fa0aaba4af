use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::place::GeoPoint;

/// `user_id` -> display name. Only used to decorate output.
pub type Profiles = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(Role::Driver),
            "passenger" => Ok(Role::Passenger),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Driver => write!(f, "driver"),
            Role::Passenger => write!(f, "passenger"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolStatus {
    Searching,
    Matched,
    InProgress,
    Other(String),
}

impl PoolStatus {
    /// Missing and blank statuses count as searching.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()) {
            None => PoolStatus::Searching,
            Some(value) if value.is_empty() || value == "searching" => PoolStatus::Searching,
            Some(value) if value == "matched" => PoolStatus::Matched,
            Some(value) if value == "in_progress" => PoolStatus::InProgress,
            Some(value) => PoolStatus::Other(value),
        }
    }

    pub fn is_active(&self) -> bool {
        *self == PoolStatus::Searching
    }
}

/// One raw pool record as read from the storage collaborator. Every field is
/// optional so a defective record can be skipped instead of failing a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PoolEntry {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<GeoPoint>,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub available_seats: Option<i64>,
    #[serde(default)]
    pub price_per_seat: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PoolEntry {
    pub fn status(&self) -> PoolStatus {
        PoolStatus::parse(self.status.as_deref())
    }

    pub fn user_key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// A pool entry that survived filtering: active, deduplicated, and complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolCandidate {
    pub user_id: String,
    pub role: Role,
    pub pickup_location: GeoPoint,
    pub pickup_address: Option<String>,
    pub destination: String,
    pub available_seats: u32,
    pub price_per_seat: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&PoolCandidate> for PoolEntry {
    fn from(candidate: &PoolCandidate) -> Self {
        PoolEntry {
            user_id: Some(candidate.user_id.clone()),
            role: Some(candidate.role.to_string()),
            pickup_location: Some(candidate.pickup_location),
            pickup_address: candidate.pickup_address.clone(),
            destination: Some(candidate.destination.clone()),
            available_seats: Some(i64::from(candidate.available_seats)),
            price_per_seat: candidate.price_per_seat,
            status: Some("searching".to_string()),
            created_at: candidate.created_at,
        }
    }
}
