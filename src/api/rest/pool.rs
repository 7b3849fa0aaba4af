use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{post, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::models::place::GeoPoint;
use crate::models::pool::{PoolEntry, Role};
use crate::store::StoredEntry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pool", post(submit_entry).get(list_entries))
        .route("/profiles/:user_id", put(upsert_profile))
}

#[derive(Deserialize)]
pub struct SubmitEntryRequest {
    pub user_id: String,
    pub role: String,
    pub pickup_location: GeoPoint,
    pub pickup_address: Option<String>,
    pub destination: String,
    pub available_seats: Option<i64>,
    pub price_per_seat: Option<f64>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpsertProfileRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub name: String,
}

async fn submit_entry(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitEntryRequest>,
) -> Result<Json<StoredEntry>, AppError> {
    let user_id = payload.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }

    let role: Role = payload.role.parse().map_err(AppError::BadRequest)?;

    if !payload.pickup_location.is_valid() {
        return Err(AppError::BadRequest(
            "pickup_location is out of range".to_string(),
        ));
    }

    if payload.available_seats.is_some_and(|seats| seats < 0) {
        return Err(AppError::BadRequest(
            "available_seats must be >= 0".to_string(),
        ));
    }

    let entry = PoolEntry {
        user_id: Some(user_id.to_string()),
        role: Some(role.to_string()),
        pickup_location: Some(payload.pickup_location),
        pickup_address: payload.pickup_address,
        destination: Some(payload.destination),
        available_seats: payload.available_seats,
        price_per_seat: payload.price_per_seat,
        status: payload.status,
        created_at: Some(Utc::now()),
    };

    let stored = state.store.submit_entry(entry);
    info!(entry_id = %stored.id, user_id, %role, "pool entry submitted");

    Ok(Json(stored))
}

async fn list_entries(State(state): State<Arc<AppState>>) -> Json<Vec<StoredEntry>> {
    Json(state.store.list_entries())
}

async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpsertProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = user_id.trim().to_string();
    let name = payload.name.trim().to_string();

    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }

    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    state.store.upsert_profile(&user_id, &name);
    Ok(Json(ProfileResponse { user_id, name }))
}
