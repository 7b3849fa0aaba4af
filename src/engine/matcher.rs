use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use crate::engine::compatibility::DestinationRule;
use crate::engine::filter::filter_pool;
use crate::models::matching::{AssignedPassenger, Match, MatchRun, MatchStats};
use crate::models::pool::{PoolCandidate, PoolEntry, Profiles};
use crate::oracle::DistanceOracle;

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 5.0;

/// Why a passenger was passed over for a driver. Only used for logging.
#[derive(Debug)]
enum Rejection {
    AlreadyAssigned,
    SameUser,
    DestinationMismatch,
    Unreachable,
    TooFar(f64),
}

/// Filters the snapshot and runs greedy first-fit assignment over it.
pub async fn match_pool(
    oracle: &DistanceOracle,
    rule: &DestinationRule,
    pool: &[PoolEntry],
    profiles: &Profiles,
    max_distance_km: f64,
) -> MatchRun {
    let filtered = filter_pool(pool);

    info!(
        pool_size = filtered.report.total,
        drivers = filtered.drivers.len(),
        passengers = filtered.passengers.len(),
        max_distance_km,
        "matching run started"
    );

    let matches = assign(
        oracle,
        rule,
        &filtered.drivers,
        &filtered.passengers,
        profiles,
        max_distance_km,
    )
    .await;

    let matched_passengers = matches
        .iter()
        .map(|trip| trip.assigned_passengers.len())
        .sum();

    info!(
        matches = matches.len(),
        matched_passengers, "matching run finished"
    );

    MatchRun {
        total_matches: matches.len(),
        max_distance_km,
        stats: MatchStats {
            pool_size: filtered.report.total,
            inactive_dropped: filtered.report.inactive,
            duplicates_dropped: filtered.report.duplicates,
            defects_dropped: filtered.report.defects,
            drivers: filtered.drivers.len(),
            passengers: filtered.passengers.len(),
            matched_passengers,
        },
        matches,
        generated_at: Utc::now(),
    }
}

/// Drivers are visited in the given order and each takes the first compatible
/// passengers (in the given order) until its seats run out. A passenger is
/// placed at most once per run. Distances are always measured from the
/// driver's own starting point.
pub async fn assign(
    oracle: &DistanceOracle,
    rule: &DestinationRule,
    drivers: &[PoolCandidate],
    passengers: &[PoolCandidate],
    profiles: &Profiles,
    max_distance_km: f64,
) -> Vec<Match> {
    let mut placed: HashSet<&str> = HashSet::new();
    let mut matches = Vec::new();

    for driver in drivers {
        let seats = driver.available_seats as usize;
        if seats == 0 {
            debug!(driver_id = %driver.user_id, "driver has no free seats");
            continue;
        }

        let mut accepted: Vec<AssignedPassenger> = Vec::new();

        for passenger in passengers {
            if accepted.len() >= seats {
                break;
            }

            match evaluate(oracle, rule, driver, passenger, &placed, max_distance_km).await {
                Ok(assigned) => {
                    debug!(
                        driver_id = %driver.user_id,
                        passenger_id = %passenger.user_id,
                        distance_km = assigned.distance_km,
                        "passenger accepted"
                    );
                    placed.insert(passenger.user_id.as_str());
                    accepted.push(AssignedPassenger {
                        name: profiles.get(&passenger.user_id).cloned(),
                        ..assigned
                    });
                }
                Err(reason) => {
                    debug!(
                        driver_id = %driver.user_id,
                        passenger_id = %passenger.user_id,
                        ?reason,
                        "passenger rejected"
                    );
                }
            }
        }

        if accepted.is_empty() {
            continue;
        }

        info!(
            driver_id = %driver.user_id,
            passengers = accepted.len(),
            seats,
            "match created"
        );

        matches.push(Match {
            driver_id: driver.user_id.clone(),
            driver_name: profiles.get(&driver.user_id).cloned(),
            driver_location: driver.pickup_location,
            pickup_address: driver.pickup_address.clone(),
            destination: driver.destination.clone(),
            available_seats: driver.available_seats,
            price_per_seat: driver.price_per_seat,
            assigned_passengers: accepted,
        });
    }

    matches
}

async fn evaluate(
    oracle: &DistanceOracle,
    rule: &DestinationRule,
    driver: &PoolCandidate,
    passenger: &PoolCandidate,
    placed: &HashSet<&str>,
    max_distance_km: f64,
) -> Result<AssignedPassenger, Rejection> {
    if placed.contains(passenger.user_id.as_str()) {
        return Err(Rejection::AlreadyAssigned);
    }

    if passenger.user_id == driver.user_id {
        return Err(Rejection::SameUser);
    }

    if !rule.is_compatible(&driver.destination, &passenger.destination) {
        return Err(Rejection::DestinationMismatch);
    }

    let distance = oracle
        .between_points(driver.pickup_location, passenger.pickup_location)
        .await;

    if distance.is_unreachable() {
        return Err(Rejection::Unreachable);
    }

    // Compare before the 2-decimal rounding of `distance_km`.
    let exact_km = distance.distance_m as f64 / 1000.0;
    if exact_km > max_distance_km {
        return Err(Rejection::TooFar(exact_km));
    }

    Ok(AssignedPassenger {
        passenger_id: passenger.user_id.clone(),
        name: None,
        pickup_location: passenger.pickup_location,
        pickup_address: passenger.pickup_address.clone(),
        destination: passenger.destination.clone(),
        distance_km: distance.distance_km,
        pickup_eta_minutes: distance.duration_minutes(),
        duration: distance.duration,
        distance_source: distance.source,
    })
}
