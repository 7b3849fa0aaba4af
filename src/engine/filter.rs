use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::pool::{PoolCandidate, PoolEntry, Role};

/// Seats assumed for a driver entry that does not state any.
const DEFAULT_DRIVER_SEATS: i64 = 1;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FilterReport {
    pub total: usize,
    pub inactive: usize,
    pub duplicates: usize,
    pub defects: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredPool {
    pub drivers: Vec<PoolCandidate>,
    pub passengers: Vec<PoolCandidate>,
    pub report: FilterReport,
}

/// Keeps searching entries, collapses each user to their most recent entry and
/// splits the survivors by role. Defective entries are logged and skipped.
pub fn filter_pool(entries: &[PoolEntry]) -> FilteredPool {
    let mut report = FilterReport {
        total: entries.len(),
        ..FilterReport::default()
    };

    let mut active: Vec<&PoolEntry> = entries
        .iter()
        .filter(|entry| {
            let keep = entry.status().is_active();
            if !keep {
                report.inactive += 1;
            }
            keep
        })
        .collect();

    // Stable: equal timestamps keep snapshot order, missing ones sort last.
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut drivers = Vec::new();
    let mut passengers = Vec::new();

    for entry in active {
        let Some(user_id) = entry.user_key() else {
            warn!(?entry, "skipping pool entry without user_id");
            report.defects += 1;
            continue;
        };

        if !seen.insert(user_id) {
            debug!(user_id, "dropping older duplicate pool entry");
            report.duplicates += 1;
            continue;
        }

        match validate(user_id, entry) {
            Ok(candidate) => match candidate.role {
                Role::Driver => drivers.push(candidate),
                Role::Passenger => passengers.push(candidate),
            },
            Err(reason) => {
                warn!(user_id, reason, "skipping defective pool entry");
                report.defects += 1;
            }
        }
    }

    debug!(
        total = report.total,
        drivers = drivers.len(),
        passengers = passengers.len(),
        duplicates = report.duplicates,
        defects = report.defects,
        "pool filtered"
    );

    FilteredPool {
        drivers,
        passengers,
        report,
    }
}

fn validate(user_id: &str, entry: &PoolEntry) -> Result<PoolCandidate, &'static str> {
    let role = entry
        .role
        .as_deref()
        .ok_or("missing role")?
        .parse::<Role>()
        .map_err(|_| "unknown role")?;

    let pickup_location = entry.pickup_location.ok_or("missing pickup coordinates")?;

    let available_seats = match role {
        Role::Driver => {
            let seats = entry.available_seats.unwrap_or(DEFAULT_DRIVER_SEATS);
            u32::try_from(seats).map_err(|_| "invalid available_seats")?
        }
        Role::Passenger => 0,
    };

    Ok(PoolCandidate {
        user_id: user_id.to_string(),
        role,
        pickup_location,
        pickup_address: entry.pickup_address.clone(),
        destination: entry.destination.clone().unwrap_or_default(),
        available_seats,
        price_per_seat: entry.price_per_seat,
        created_at: entry.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::filter_pool;
    use crate::models::place::GeoPoint;
    use crate::models::pool::{PoolEntry, Role};

    fn entry(user: &str, role: &str, minutes: i64) -> PoolEntry {
        PoolEntry {
            user_id: Some(user.to_string()),
            role: Some(role.to_string()),
            pickup_location: Some(GeoPoint::new(4.86, -74.05)),
            destination: Some("Universidad de La Sabana".to_string()),
            available_seats: (role == "driver").then_some(3),
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap() + Duration::minutes(minutes)),
            ..PoolEntry::default()
        }
    }

    #[test]
    fn later_entry_wins_for_the_same_user() {
        let mut early = entry("ana@campus.edu", "passenger", 0);
        early.pickup_address = Some("old address".to_string());
        let mut late = entry("ana@campus.edu", "passenger", 10);
        late.pickup_address = Some("new address".to_string());

        let filtered = filter_pool(&[early, late]);

        assert_eq!(filtered.passengers.len(), 1);
        assert_eq!(filtered.passengers[0].pickup_address.as_deref(), Some("new address"));
        assert_eq!(filtered.report.duplicates, 1);
    }

    #[test]
    fn only_searching_or_blank_statuses_survive() {
        let mut matched = entry("a@campus.edu", "passenger", 0);
        matched.status = Some("matched".to_string());
        let mut in_progress = entry("b@campus.edu", "passenger", 0);
        in_progress.status = Some("in_progress".to_string());
        let mut blank = entry("c@campus.edu", "passenger", 0);
        blank.status = Some(String::new());
        let mut searching = entry("d@campus.edu", "driver", 0);
        searching.status = Some("searching".to_string());
        let missing = entry("e@campus.edu", "passenger", 0);

        let filtered = filter_pool(&[matched, in_progress, blank, searching, missing]);

        assert_eq!(filtered.report.inactive, 2);
        assert_eq!(filtered.drivers.len(), 1);
        let ids: Vec<&str> = filtered.passengers.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["c@campus.edu", "e@campus.edu"]);
    }

    #[test]
    fn defective_entries_are_skipped() {
        let mut no_user = entry("x", "passenger", 0);
        no_user.user_id = Some("   ".to_string());
        let mut no_coords = entry("y@campus.edu", "passenger", 0);
        no_coords.pickup_location = None;
        let mut negative_seats = entry("z@campus.edu", "driver", 0);
        negative_seats.available_seats = Some(-1);
        let mut bad_role = entry("w@campus.edu", "conductor", 0);
        bad_role.role = Some("pilot".to_string());

        let filtered = filter_pool(&[no_user, no_coords, negative_seats, bad_role]);

        assert!(filtered.drivers.is_empty());
        assert!(filtered.passengers.is_empty());
        assert_eq!(filtered.report.defects, 4);
    }

    #[test]
    fn drivers_without_seat_count_get_one_seat() {
        let mut driver = entry("d@campus.edu", "driver", 0);
        driver.available_seats = None;

        let filtered = filter_pool(&[driver]);
        assert_eq!(filtered.drivers[0].available_seats, 1);
        assert_eq!(filtered.drivers[0].role, Role::Driver);
    }

    #[test]
    fn newest_entries_come_first_and_untimed_last() {
        let mut untimed = entry("u@campus.edu", "passenger", 0);
        untimed.created_at = None;
        let old = entry("o@campus.edu", "passenger", 1);
        let new = entry("n@campus.edu", "passenger", 5);

        let filtered = filter_pool(&[untimed, old, new]);
        let ids: Vec<&str> = filtered.passengers.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["n@campus.edu", "o@campus.edu", "u@campus.edu"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let entries = vec![
            entry("d1@campus.edu", "driver", 3),
            entry("p1@campus.edu", "passenger", 2),
            entry("p1@campus.edu", "passenger", 7),
            entry("p2@campus.edu", "passenger", 1),
        ];

        let once = filter_pool(&entries);
        let replay: Vec<PoolEntry> = once
            .drivers
            .iter()
            .chain(once.passengers.iter())
            .map(PoolEntry::from)
            .collect();
        let twice = filter_pool(&replay);

        assert_eq!(once.drivers, twice.drivers);
        assert_eq!(once.passengers, twice.passengers);
        assert_eq!(twice.report.duplicates, 0);
    }
}
