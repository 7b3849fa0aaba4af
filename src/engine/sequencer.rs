//! School-run stop ordering for one matched driver.
//!
//! Outbound, passengers farthest from the destination are picked up first so
//! the car fills while converging on it. On the return trip, passengers closest
//! to the destination are dropped first so the driver ends nearest home.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::geo::round_to;
use crate::models::distance::DistanceResult;
use crate::models::matching::{AssignedPassenger, Match};
use crate::models::place::Place;
use crate::models::route::{Direction, Itinerary, RouteStep, StepKind};
use crate::oracle::DistanceOracle;

struct Ranked<'a> {
    passenger: &'a AssignedPassenger,
    reference: DistanceResult,
}

/// Ranking reference: duration first, distance second. Equal keys keep input order.
fn compare_reference(a: &DistanceResult, b: &DistanceResult) -> Ordering {
    a.duration_s
        .cmp(&b.duration_s)
        .then(a.distance_m.cmp(&b.distance_m))
}

/// Orders the match's stops for `direction` and walks them leg by leg.
pub async fn sequence(
    oracle: &DistanceOracle,
    trip: &Match,
    destination: &Place,
    direction: Direction,
) -> Itinerary {
    let home = Place::Point(trip.driver_location);
    let (start, end) = match direction {
        Direction::Outbound => (home, destination.clone()),
        Direction::Return => (destination.clone(), home),
    };

    let order = visiting_order(oracle, trip, destination, direction).await;

    let mut builder = ItineraryBuilder::new(direction);
    builder.push_origin(start.clone(), trip, destination);

    let mut previous = start;
    for passenger in order {
        let stop = Place::Point(passenger.pickup_location);
        let leg = oracle.between(&previous, &stop).await;
        builder.push_passenger(passenger, stop.clone(), &leg);
        // Unresolvable stops are skipped as leg origins.
        if passenger.pickup_location.is_valid() {
            previous = stop;
        }
    }

    let leg = oracle.between(&previous, &end).await;
    builder.push_endpoint(end, trip, &leg);

    let itinerary = builder.finish();

    info!(
        driver_id = %trip.driver_id,
        direction = direction.as_str(),
        steps = itinerary.total_steps,
        total_distance_m = itinerary.total_distance_m,
        total_duration_s = itinerary.total_duration_s,
        "route sequenced"
    );

    itinerary
}

/// Passengers whose reference lookup failed go last, after every ranked one.
async fn visiting_order<'a>(
    oracle: &DistanceOracle,
    trip: &'a Match,
    destination: &Place,
    direction: Direction,
) -> Vec<&'a AssignedPassenger> {
    let mut ranked: Vec<Ranked<'a>> = Vec::with_capacity(trip.assigned_passengers.len());
    let mut unranked: Vec<&'a AssignedPassenger> = Vec::new();

    for passenger in &trip.assigned_passengers {
        let stop = Place::Point(passenger.pickup_location);
        let reference = match direction {
            Direction::Outbound => oracle.between(&stop, destination).await,
            Direction::Return => oracle.between(destination, &stop).await,
        };

        if reference.is_unreachable() {
            warn!(
                driver_id = %trip.driver_id,
                passenger_id = %passenger.passenger_id,
                "reference distance unavailable; stop moved to the end"
            );
            unranked.push(passenger);
        } else {
            ranked.push(Ranked { passenger, reference });
        }
    }

    match direction {
        Direction::Outbound => ranked.sort_by(|a, b| compare_reference(&b.reference, &a.reference)),
        Direction::Return => ranked.sort_by(|a, b| compare_reference(&a.reference, &b.reference)),
    }

    ranked
        .into_iter()
        .map(|entry| entry.passenger)
        .chain(unranked)
        .collect()
}

struct ItineraryBuilder {
    direction: Direction,
    steps: Vec<RouteStep>,
    cumulative_distance_m: u64,
    cumulative_duration_s: u64,
}

impl ItineraryBuilder {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            steps: Vec::new(),
            cumulative_distance_m: 0,
            cumulative_duration_s: 0,
        }
    }

    fn push_origin(&mut self, location: Place, trip: &Match, destination: &Place) {
        let (actor_id, instruction) = match self.direction {
            Direction::Outbound => (
                Some(trip.driver_id.clone()),
                "Start from the driver's origin".to_string(),
            ),
            Direction::Return => (None, format!("Depart from {}", destination.label())),
        };

        self.steps.push(RouteStep {
            step_index: 0,
            kind: StepKind::Origin,
            actor_id,
            location,
            leg_distance_m: 0,
            leg_duration_s: 0,
            leg_source: None,
            cumulative_distance_m: 0,
            cumulative_duration_s: 0,
            eta_minutes: 0.0,
            instruction,
        });
    }

    fn push_passenger(&mut self, passenger: &AssignedPassenger, location: Place, leg: &DistanceResult) {
        let who = passenger.name.as_deref().unwrap_or(&passenger.passenger_id);
        let (kind, instruction) = match self.direction {
            Direction::Outbound => (StepKind::Pickup, format!("Pick up {who}")),
            Direction::Return => (StepKind::Dropoff, format!("Drop off {who}")),
        };

        self.push(kind, Some(passenger.passenger_id.clone()), location, leg, instruction);
    }

    fn push_endpoint(&mut self, location: Place, trip: &Match, leg: &DistanceResult) {
        let (actor_id, instruction) = match self.direction {
            Direction::Outbound => (None, format!("Arrive at {}", location.label())),
            Direction::Return => (
                Some(trip.driver_id.clone()),
                "Arrive at the driver's home".to_string(),
            ),
        };

        self.push(StepKind::Destination, actor_id, location, leg, instruction);
    }

    fn push(
        &mut self,
        kind: StepKind,
        actor_id: Option<String>,
        location: Place,
        leg: &DistanceResult,
        instruction: String,
    ) {
        // An unresolvable leg adds nothing to the running totals.
        let (leg_distance_m, leg_duration_s) = if leg.is_unreachable() {
            warn!(to = %location.label(), "leg distance unavailable; counted as zero");
            (0, 0)
        } else {
            (leg.distance_m, leg.duration_s)
        };

        self.cumulative_distance_m += leg_distance_m;
        self.cumulative_duration_s += leg_duration_s;

        self.steps.push(RouteStep {
            step_index: self.steps.len(),
            kind,
            actor_id,
            location,
            leg_distance_m,
            leg_duration_s,
            leg_source: Some(leg.source),
            cumulative_distance_m: self.cumulative_distance_m,
            cumulative_duration_s: self.cumulative_duration_s,
            eta_minutes: minutes(self.cumulative_duration_s),
            instruction,
        });
    }

    fn finish(self) -> Itinerary {
        Itinerary {
            direction: self.direction,
            optimization_method: self.direction.optimization_method().to_string(),
            total_steps: self.steps.len(),
            total_distance_m: self.cumulative_distance_m,
            total_duration_s: self.cumulative_duration_s,
            total_duration_minutes: minutes(self.cumulative_duration_s),
            steps: self.steps,
        }
    }
}

fn minutes(seconds: u64) -> f64 {
    round_to(seconds as f64 / 60.0, 2)
}
