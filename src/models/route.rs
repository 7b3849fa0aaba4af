use serde::{Deserialize, Serialize};

use crate::models::distance::DistanceSource;
use crate::models::place::Place;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driver origin -> pickups -> destination.
    Outbound,
    /// Destination -> drop-offs -> driver home.
    Return,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Return => "return",
        }
    }

    pub fn optimization_method(&self) -> &'static str {
        match self {
            Direction::Outbound => "school_route_farthest_first",
            Direction::Return => "school_route_closest_first",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Origin,
    Pickup,
    Dropoff,
    Destination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStep {
    pub step_index: usize,
    pub kind: StepKind,
    pub actor_id: Option<String>,
    pub location: Place,
    pub leg_distance_m: u64,
    pub leg_duration_s: u64,
    pub leg_source: Option<DistanceSource>,
    pub cumulative_distance_m: u64,
    pub cumulative_duration_s: u64,
    pub eta_minutes: f64,
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub direction: Direction,
    pub optimization_method: String,
    pub steps: Vec<RouteStep>,
    pub total_steps: usize,
    pub total_distance_m: u64,
    pub total_duration_s: u64,
    pub total_duration_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepView {
    pub step: RouteStep,
    pub current_step: usize,
    pub total_steps: usize,
    pub is_last_step: bool,
}

impl Itinerary {
    pub fn step_view(&self, index: usize) -> Option<StepView> {
        self.steps.get(index).map(|step| StepView {
            step: step.clone(),
            current_step: index,
            total_steps: self.steps.len(),
            is_last_step: index + 1 == self.steps.len(),
        })
    }

    /// `None` once `current` is the final stop.
    pub fn next_step(&self, current: usize) -> Option<StepView> {
        self.step_view(current.checked_add(1)?)
    }

    pub fn visiting_order(&self) -> Vec<Option<&str>> {
        self.steps.iter().map(|step| step.actor_id.as_deref()).collect()
    }
}
