use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use campus_pool::api::rest::router;
use campus_pool::engine::compatibility::DestinationRule;
use campus_pool::oracle::DistanceOracle;
use campus_pool::state::AppState;
use campus_pool::store::InMemoryPoolStore;
use serde_json::{json, Value};
use tower::ServiceExt;

const DEG_PER_KM: f64 = 1.0 / 111.194_9;
const CAMPUS_LAT: f64 = 4.8617;
const CAMPUS_LNG: f64 = -74.0323;

fn new_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(InMemoryPoolStore::new()),
        DistanceOracle::estimated_only(),
        DestinationRule::default(),
        5.0,
        16,
    ))
}

fn setup() -> axum::Router {
    router(new_state())
}

fn north_of_campus(km: f64) -> Value {
    json!({ "lat": CAMPUS_LAT + km * DEG_PER_KM, "lng": CAMPUS_LNG })
}

fn campus() -> Value {
    json!({ "lat": CAMPUS_LAT, "lng": CAMPUS_LNG })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn driver_entry(user_id: &str, km: f64, seats: i64, created_at: &str) -> Value {
    json!({
        "user_id": user_id,
        "role": "driver",
        "pickup_location": north_of_campus(km),
        "destination": "Universidad de La Sabana",
        "available_seats": seats,
        "price_per_seat": 4000.0,
        "status": "searching",
        "created_at": created_at
    })
}

fn passenger_entry(user_id: &str, km: f64, destination: &str, created_at: &str) -> Value {
    json!({
        "user_id": user_id,
        "role": "passenger",
        "pickup_location": north_of_campus(km),
        "destination": destination,
        "status": null,
        "created_at": created_at
    })
}

fn submission(user_id: &str, role: &str, km: f64, seats: Option<i64>) -> Value {
    json!({
        "user_id": user_id,
        "role": role,
        "pickup_location": north_of_campus(km),
        "destination": "Universidad de La Sabana",
        "available_seats": seats
    })
}

fn passenger_in_match(user_id: &str, km: f64) -> Value {
    json!({
        "passenger_id": user_id,
        "name": null,
        "pickup_location": north_of_campus(km),
        "pickup_address": null,
        "destination": "Universidad de La Sabana",
        "distance_km": 0.0,
        "duration": "N/A",
        "distance_source": "estimated",
        "pickup_eta_minutes": 0
    })
}

fn trip(passengers: Vec<Value>) -> Value {
    json!({
        "driver_id": "driver@campus.edu",
        "driver_name": "Diana",
        "driver_location": north_of_campus(6.0),
        "pickup_address": null,
        "destination": "Universidad de La Sabana",
        "available_seats": 3,
        "price_per_seat": null,
        "assigned_passengers": passengers
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pool_entries"], 0);
    assert_eq!(body["profiles"], 0);
    assert_eq!(body["live_oracle"], false);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("match_runs_total"));
}

#[tokio::test]
async fn submit_pool_entry_is_listed() {
    let app = setup();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/pool",
            submission("ana@campus.edu", "Driver", 3.0, Some(2)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = body_json(response).await;
    assert_eq!(stored["user_id"], "ana@campus.edu");
    assert_eq!(stored["role"], "driver");
    assert!(!stored["id"].as_str().unwrap().is_empty());
    assert!(stored["created_at"].is_string());

    let response = app.oneshot(get_request("/pool")).await.unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn submit_with_blank_user_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/pool",
            submission("  ", "driver", 3.0, Some(2)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_with_unknown_role_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/pool",
            submission("ana@campus.edu", "navigator", 3.0, None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("navigator"));
}

#[tokio::test]
async fn submit_with_negative_seats_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/pool",
            submission("ana@campus.edu", "driver", 3.0, Some(-1)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_upsert_rejects_blank_name() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "PUT",
            "/profiles/ana@campus.edu",
            json!({ "name": " " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn match_gives_single_seat_to_first_compatible_passenger() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/match",
            json!({
                "pool": [
                    driver_entry("driver@campus.edu", 3.0, 1, "2026-03-01T07:00:00Z"),
                    passenger_entry("p1@campus.edu", 2.0, "Universidad de La Sabana", "2026-03-01T06:59:00Z"),
                    passenger_entry("p2@campus.edu", 2.5, "universidad de la sabana ", "2026-03-01T06:58:00Z")
                ],
                "profiles": { "p1@campus.edu": "Pablo" }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let run = body_json(response).await;
    assert_eq!(run["total_matches"], 1);
    assert_eq!(run["max_distance_km"], 5.0);

    let assigned = run["matches"][0]["assigned_passengers"].as_array().unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0]["passenger_id"], "p1@campus.edu");
    assert_eq!(assigned[0]["name"], "Pablo");
}

#[tokio::test]
async fn match_without_live_service_reports_estimates() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/match",
            json!({
                "pool": [
                    driver_entry("driver@campus.edu", 4.0, 3, "2026-03-01T07:00:00Z"),
                    passenger_entry("p1@campus.edu", 2.0, "Universidad de La Sabana", "2026-03-01T06:59:00Z")
                ],
                "profiles": {}
            }),
        ))
        .await
        .unwrap();

    let run = body_json(response).await;
    let passenger = &run["matches"][0]["assigned_passengers"][0];
    assert_eq!(passenger["distance_source"], "estimated");

    let km = passenger["distance_km"].as_f64().unwrap();
    assert!((km - 2.0).abs() < 0.05, "unexpected distance {km}");
    assert_eq!(passenger["duration"], "~3 min");
}

#[tokio::test]
async fn match_keeps_only_latest_entry_per_user() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/match",
            json!({
                "pool": [
                    driver_entry("driver@campus.edu", 3.0, 2, "2026-03-01T07:00:00Z"),
                    passenger_entry("p1@campus.edu", 40.0, "Universidad de La Sabana", "2026-03-01T06:00:00Z"),
                    passenger_entry("p1@campus.edu", 2.0, "Universidad de La Sabana", "2026-03-01T06:30:00Z")
                ],
                "profiles": {}
            }),
        ))
        .await
        .unwrap();

    let run = body_json(response).await;
    assert_eq!(run["stats"]["duplicates_dropped"], 1);

    let assigned = run["matches"][0]["assigned_passengers"].as_array().unwrap();
    assert_eq!(assigned.len(), 1);
    let lat = assigned[0]["pickup_location"]["lat"].as_f64().unwrap();
    assert!((lat - (CAMPUS_LAT + 2.0 * DEG_PER_KM)).abs() < 1e-9);
}

#[tokio::test]
async fn match_with_negative_radius_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/match",
            json!({ "pool": [], "profiles": {}, "max_distance_km": -1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stored_pool_run_and_user_lookup() {
    let state = new_state();
    let app = router(state.clone());
    let mut events = state.match_events_tx.subscribe();

    for body in [
        submission("driver@campus.edu", "driver", 3.0, Some(2)),
        submission("p1@campus.edu", "passenger", 2.0, None),
        submission("far@campus.edu", "passenger", 30.0, None),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/pool", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/profiles/driver@campus.edu", json!({ "name": "Diana" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/matches/run", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let run = body_json(response).await;
    assert_eq!(run["total_matches"], 1);
    assert_eq!(run["matches"][0]["driver_name"], "Diana");

    let broadcast = events.recv().await.unwrap();
    assert_eq!(broadcast.total_matches, 1);

    let response = app
        .clone()
        .oneshot(get_request("/matches/p1@campus.edu"))
        .await
        .unwrap();
    let found = body_json(response).await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["matches"][0]["role"], "passenger");
    assert_eq!(found["matches"][0]["match"]["driver_id"], "driver@campus.edu");
    assert_eq!(
        found["matches"][0]["passenger_details"]["passenger_id"],
        "p1@campus.edu"
    );

    let response = app
        .oneshot(get_request("/matches/far@campus.edu"))
        .await
        .unwrap();
    let found = body_json(response).await;
    assert_eq!(found["total"], 0);
}

#[tokio::test]
async fn outbound_sequence_visits_farthest_passenger_first() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/routes/sequence",
            json!({
                "match": trip(vec![
                    passenger_in_match("p1@campus.edu", 2.0),
                    passenger_in_match("p2@campus.edu", 4.0)
                ]),
                "destination": campus(),
                "direction": "outbound"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let itinerary = body_json(response).await;
    assert_eq!(itinerary["optimization_method"], "school_route_farthest_first");
    assert_eq!(itinerary["total_steps"], 4);

    let actors: Vec<Value> = itinerary["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["actor_id"].clone())
        .collect();
    assert_eq!(
        actors,
        vec![
            json!("driver@campus.edu"),
            json!("p2@campus.edu"),
            json!("p1@campus.edu"),
            Value::Null
        ]
    );

    let last = &itinerary["steps"][3];
    assert_eq!(last["kind"], "destination");
    assert_eq!(last["cumulative_distance_m"], itinerary["total_distance_m"]);
}

#[tokio::test]
async fn return_sequence_drops_closest_passenger_first() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/routes/sequence",
            json!({
                "match": trip(vec![
                    passenger_in_match("p2@campus.edu", 4.0),
                    passenger_in_match("p1@campus.edu", 2.0)
                ]),
                "destination": campus(),
                "direction": "return"
            }),
        ))
        .await
        .unwrap();

    let itinerary = body_json(response).await;
    assert_eq!(itinerary["optimization_method"], "school_route_closest_first");
    assert_eq!(itinerary["steps"][1]["actor_id"], "p1@campus.edu");
    assert_eq!(itinerary["steps"][1]["kind"], "dropoff");
    assert_eq!(itinerary["steps"][2]["actor_id"], "p2@campus.edu");
    assert_eq!(itinerary["steps"][3]["actor_id"], "driver@campus.edu");
}

#[tokio::test]
async fn step_view_marks_last_step() {
    let app = setup();
    let body = json!({
        "match": trip(vec![passenger_in_match("p1@campus.edu", 2.0)]),
        "destination": campus(),
        "direction": "outbound"
    });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/routes/sequence/steps/2", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["current_step"], 2);
    assert_eq!(view["total_steps"], 3);
    assert_eq!(view["is_last_step"], true);

    let response = app
        .oneshot(json_request("POST", "/routes/sequence/steps/3", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sequence_without_passengers_has_two_steps() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/routes/sequence",
            json!({
                "match": trip(vec![]),
                "destination": campus(),
                "direction": "outbound"
            }),
        ))
        .await
        .unwrap();

    let itinerary = body_json(response).await;
    assert_eq!(itinerary["total_steps"], 2);
    assert_eq!(itinerary["steps"][0]["kind"], "origin");
    assert_eq!(itinerary["steps"][1]["kind"], "destination");
}
