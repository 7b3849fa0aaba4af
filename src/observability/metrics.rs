use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::models::matching::MatchRun;
use crate::models::route::Itinerary;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub match_runs_total: IntCounter,
    pub matched_passengers_total: IntCounter,
    pub match_run_latency_seconds: Histogram,
    pub pool_entries_dropped_total: IntCounterVec,
    pub distance_lookups_total: IntCounterVec,
    pub route_sequence_latency_seconds: HistogramVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let match_runs_total = IntCounter::new("match_runs_total", "Total matching runs")
            .expect("valid match_runs_total metric");

        let matched_passengers_total = IntCounter::new(
            "matched_passengers_total",
            "Passengers placed with a driver across all runs",
        )
        .expect("valid matched_passengers_total metric");

        let match_run_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "match_run_latency_seconds",
            "Latency of a full matching run in seconds",
        ))
        .expect("valid match_run_latency_seconds metric");

        let pool_entries_dropped_total = IntCounterVec::new(
            Opts::new(
                "pool_entries_dropped_total",
                "Pool entries dropped before matching, by reason",
            ),
            &["reason"],
        )
        .expect("valid pool_entries_dropped_total metric");

        let distance_lookups_total = IntCounterVec::new(
            Opts::new("distance_lookups_total", "Distance lookups by result source"),
            &["source"],
        )
        .expect("valid distance_lookups_total metric");

        let route_sequence_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "route_sequence_latency_seconds",
                "Latency of route sequencing in seconds",
            ),
            &["direction"],
        )
        .expect("valid route_sequence_latency_seconds metric");

        registry
            .register(Box::new(match_runs_total.clone()))
            .expect("register match_runs_total");
        registry
            .register(Box::new(matched_passengers_total.clone()))
            .expect("register matched_passengers_total");
        registry
            .register(Box::new(match_run_latency_seconds.clone()))
            .expect("register match_run_latency_seconds");
        registry
            .register(Box::new(pool_entries_dropped_total.clone()))
            .expect("register pool_entries_dropped_total");
        registry
            .register(Box::new(distance_lookups_total.clone()))
            .expect("register distance_lookups_total");
        registry
            .register(Box::new(route_sequence_latency_seconds.clone()))
            .expect("register route_sequence_latency_seconds");

        Self {
            registry,
            match_runs_total,
            matched_passengers_total,
            match_run_latency_seconds,
            pool_entries_dropped_total,
            distance_lookups_total,
            route_sequence_latency_seconds,
        }
    }

    pub fn record_match_run(&self, run: &MatchRun, elapsed_secs: f64) {
        self.match_runs_total.inc();
        self.matched_passengers_total
            .inc_by(run.stats.matched_passengers as u64);
        self.match_run_latency_seconds.observe(elapsed_secs);

        for (reason, count) in [
            ("inactive", run.stats.inactive_dropped),
            ("duplicate", run.stats.duplicates_dropped),
            ("defect", run.stats.defects_dropped),
        ] {
            self.pool_entries_dropped_total
                .with_label_values(&[reason])
                .inc_by(count as u64);
        }
    }

    pub fn record_itinerary(&self, itinerary: &Itinerary, elapsed_secs: f64) {
        self.route_sequence_latency_seconds
            .with_label_values(&[itinerary.direction.as_str()])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
