use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::engine::compatibility::DestinationRule;
use crate::engine::matcher::match_pool;
use crate::error::AppError;
use crate::models::matching::MatchRun;
use crate::models::pool::{PoolEntry, Profiles};
use crate::observability::metrics::Metrics;
use crate::oracle::DistanceOracle;
use crate::store::{InMemoryPoolStore, PoolStore};

pub struct AppState {
    pub store: Arc<dyn PoolStore>,
    pub oracle: Arc<DistanceOracle>,
    pub destination_rule: DestinationRule,
    pub default_max_distance_km: f64,
    pub match_events_tx: broadcast::Sender<MatchRun>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PoolStore>,
        oracle: DistanceOracle,
        destination_rule: DestinationRule,
        default_max_distance_km: f64,
        event_buffer_size: usize,
    ) -> Self {
        let metrics = Metrics::new();
        let (match_events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        let oracle = oracle.with_lookup_counter(metrics.distance_lookups_total.clone());

        Self {
            store,
            oracle: Arc::new(oracle),
            destination_rule,
            default_max_distance_km,
            match_events_tx,
            metrics,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let oracle = DistanceOracle::from_config(config)?;

        Ok(Self::new(
            Arc::new(InMemoryPoolStore::new()),
            oracle,
            DestinationRule::new(&config.landmark_keywords),
            config.default_max_distance_km,
            config.event_buffer_size,
        ))
    }

    /// Runs the matcher over `pool` and records the run's metrics.
    pub async fn run_matching(
        &self,
        pool: &[PoolEntry],
        profiles: &Profiles,
        max_distance_km: f64,
    ) -> MatchRun {
        let started = Instant::now();
        let run = match_pool(
            &self.oracle,
            &self.destination_rule,
            pool,
            profiles,
            max_distance_km,
        )
        .await;

        self.metrics
            .record_match_run(&run, started.elapsed().as_secs_f64());
        run
    }

    /// Same as [`AppState::run_matching`] over the current store snapshot.
    pub async fn run_stored_matching(&self, max_distance_km: f64) -> MatchRun {
        let pool = self.store.snapshot_pool();
        let profiles = self.store.snapshot_profiles();
        self.run_matching(&pool, &profiles, max_distance_km).await
    }

    pub fn resolve_max_distance(&self, requested: Option<f64>) -> Result<f64, AppError> {
        match requested {
            None => Ok(self.default_max_distance_km),
            Some(km) if km.is_finite() && km >= 0.0 => Ok(km),
            Some(km) => Err(AppError::BadRequest(format!(
                "max_distance_km must be a non-negative number, got {km}"
            ))),
        }
    }
}
