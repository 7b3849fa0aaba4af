use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::sequencer::sequence;
use crate::error::AppError;
use crate::models::matching::Match;
use crate::models::place::Place;
use crate::models::route::{Direction, Itinerary, StepView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes/sequence", post(sequence_route))
        .route("/routes/sequence/steps/:n", post(route_step))
}

#[derive(Deserialize)]
pub struct SequenceRequest {
    #[serde(rename = "match")]
    pub trip: Match,
    pub destination: Place,
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

fn default_direction() -> Direction {
    Direction::Outbound
}

async fn build_itinerary(state: &AppState, payload: &SequenceRequest) -> Result<Itinerary, AppError> {
    match &payload.destination {
        Place::Address(address) if address.trim().is_empty() => {
            return Err(AppError::BadRequest(
                "destination cannot be empty".to_string(),
            ));
        }
        Place::Point(point) if !point.is_valid() => {
            return Err(AppError::BadRequest(
                "destination is out of range".to_string(),
            ));
        }
        _ => {}
    }

    let started = Instant::now();
    let itinerary = sequence(
        &state.oracle,
        &payload.trip,
        &payload.destination,
        payload.direction,
    )
    .await;

    state
        .metrics
        .record_itinerary(&itinerary, started.elapsed().as_secs_f64());
    Ok(itinerary)
}

async fn sequence_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SequenceRequest>,
) -> Result<Json<Itinerary>, AppError> {
    let itinerary = build_itinerary(&state, &payload).await?;
    Ok(Json(itinerary))
}

async fn route_step(
    State(state): State<Arc<AppState>>,
    Path(n): Path<usize>,
    Json(payload): Json<SequenceRequest>,
) -> Result<Json<StepView>, AppError> {
    let itinerary = build_itinerary(&state, &payload).await?;

    let view = itinerary.step_view(n).ok_or_else(|| {
        AppError::NotFound(format!(
            "step {n} not found (itinerary has {} steps)",
            itinerary.total_steps
        ))
    })?;

    Ok(Json(view))
}
