//! Distance oracle: live routing service first, great-circle estimate second,
//! an `error` sentinel when neither can produce a number.

pub mod cache;
pub mod error;
pub mod google;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prometheus::IntCounterVec;
use tracing::{debug, warn};

use crate::config::Config;
use crate::geo::checked_haversine_km;
use crate::models::distance::{DistanceResult, LiveMeasurement, TravelMode};
use crate::models::place::{GeoPoint, Place};
use crate::oracle::cache::{CacheKey, DistanceCache};
use crate::oracle::error::OracleError;
use crate::oracle::google::GoogleDistanceMatrix;
use crate::oracle::retry::{with_retry, RetryPolicy};

/// A live routing backend. Implementations only report raw figures; timeout,
/// retry and fallback are applied by [`DistanceOracle`].
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn measure(
        &self,
        origin: &Place,
        destination: &Place,
        mode: TravelMode,
    ) -> Result<LiveMeasurement, OracleError>;
}

pub struct DistanceOracle {
    provider: Option<Arc<dyn DistanceProvider>>,
    cache: Option<DistanceCache>,
    retry: RetryPolicy,
    mode: TravelMode,
    lookups: Option<IntCounterVec>,
}

impl DistanceOracle {
    pub fn new(provider: Option<Arc<dyn DistanceProvider>>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            cache: None,
            retry,
            mode: TravelMode::Driving,
            lookups: None,
        }
    }

    /// Oracle with no live service: every answer is a great-circle estimate.
    pub fn estimated_only() -> Self {
        Self::new(None, RetryPolicy::default())
    }

    pub fn from_config(config: &Config) -> Result<Self, OracleError> {
        let timeout = Duration::from_millis(config.oracle_timeout_ms);
        let retry = RetryPolicy::new(timeout, config.oracle_max_retries);

        let provider: Option<Arc<dyn DistanceProvider>> = match &config.maps_api_key {
            Some(api_key) => Some(Arc::new(GoogleDistanceMatrix::new(
                &config.maps_distance_endpoint,
                api_key,
                timeout,
            )?)),
            None => {
                warn!("no maps api key configured; distances will be great-circle estimates");
                None
            }
        };

        let oracle = Self::new(provider, retry);
        Ok(if config.oracle_cache {
            oracle.with_cache()
        } else {
            oracle
        })
    }

    pub fn with_cache(mut self) -> Self {
        self.cache = Some(DistanceCache::new());
        self
    }

    /// Counts every resolved lookup under a `source` label.
    pub fn with_lookup_counter(mut self, counter: IntCounterVec) -> Self {
        self.lookups = Some(counter);
        self
    }

    pub fn has_live_service(&self) -> bool {
        self.provider.is_some()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.as_ref().map_or(0, DistanceCache::len)
    }

    pub async fn between_points(&self, origin: GeoPoint, destination: GeoPoint) -> DistanceResult {
        self.between(&Place::Point(origin), &Place::Point(destination))
            .await
    }

    /// Never fails: callers must treat `source = error` as unmatchable.
    pub async fn between(&self, origin: &Place, destination: &Place) -> DistanceResult {
        let result = self.resolve(origin, destination).await;

        if let Some(counter) = &self.lookups {
            counter.with_label_values(&[result.source.as_str()]).inc();
        }

        result
    }

    async fn resolve(&self, origin: &Place, destination: &Place) -> DistanceResult {
        let key = CacheKey::new(origin, destination, self.mode);
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return hit;
        }

        if let Some(provider) = &self.provider {
            let outcome = with_retry(&self.retry, || {
                provider.measure(origin, destination, self.mode)
            })
            .await;

            match outcome {
                Ok(measurement) => {
                    let result = DistanceResult::live(measurement);
                    if let Some(cache) = &self.cache {
                        cache.insert(key, result.clone());
                    }
                    return result;
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        origin = %origin.label(),
                        destination = %destination.label(),
                        error = %err,
                        "live distance lookup failed; using great-circle estimate"
                    );
                }
            }
        }

        estimate(origin, destination)
    }
}

/// Great-circle fallback. Addresses cannot be estimated without a live service.
pub fn estimate(origin: &Place, destination: &Place) -> DistanceResult {
    let distance = match (origin.as_point(), destination.as_point()) {
        (Some(a), Some(b)) => checked_haversine_km(&a, &b),
        _ => None,
    };

    match distance {
        Some(distance_km) => DistanceResult::estimated(distance_km),
        None => {
            debug!(
                origin = %origin.label(),
                destination = %destination.label(),
                "no estimate possible; reporting unreachable"
            );
            DistanceResult::unreachable()
        }
    }
}
