use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::matching::{matches_for_user, MatchRun, UserMatch};
use crate::models::pool::{PoolEntry, Profiles};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/match", post(match_snapshot))
        .route("/matches/run", post(run_matches))
        .route("/matches/:user_id", get(user_matches))
}

#[derive(Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub pool: Vec<PoolEntry>,
    #[serde(default)]
    pub profiles: Profiles,
    pub max_distance_km: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct RunMatchesRequest {
    pub max_distance_km: Option<f64>,
}

#[derive(Serialize)]
pub struct UserMatchesResponse {
    pub user_id: String,
    pub total: usize,
    pub matches: Vec<UserMatch>,
}

/// Matches a caller-supplied snapshot without touching the store.
async fn match_snapshot(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchRun>, AppError> {
    let max_distance_km = state.resolve_max_distance(payload.max_distance_km)?;
    let run = state
        .run_matching(&payload.pool, &payload.profiles, max_distance_km)
        .await;

    Ok(Json(run))
}

async fn run_matches(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<RunMatchesRequest>>,
) -> Result<Json<MatchRun>, AppError> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let max_distance_km = state.resolve_max_distance(payload.max_distance_km)?;
    let run = state.run_stored_matching(max_distance_km).await;

    match state.match_events_tx.send(run.clone()) {
        Ok(subscribers) => info!(subscribers, "match run broadcast"),
        Err(_) => debug!("no websocket subscribers for match run"),
    }

    Ok(Json(run))
}

async fn user_matches(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserMatchesResponse>, AppError> {
    let user_id = user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }

    let run = state
        .run_stored_matching(state.default_max_distance_km)
        .await;
    let matches = matches_for_user(&run.matches, &user_id);

    Ok(Json(UserMatchesResponse {
        total: matches.len(),
        user_id,
        matches,
    }))
}
