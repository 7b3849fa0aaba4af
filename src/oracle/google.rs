//! Distance Matrix style HTTP client (Google Maps JSON shape).
//!
//! One origin, one destination per request. The response is parsed into a
//! [`LiveMeasurement`]; anything but an `OK` top-level and element status is
//! an error so the oracle can fall back to its estimate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::distance::{LiveMeasurement, TravelMode};
use crate::models::place::Place;
use crate::oracle::error::OracleError;
use crate::oracle::DistanceProvider;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

#[derive(Debug, Clone)]
pub struct GoogleDistanceMatrix {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleDistanceMatrix {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
    duration_in_traffic: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

fn parse_matrix_response(response: MatrixResponse) -> Result<LiveMeasurement, OracleError> {
    if response.status != "OK" {
        return Err(OracleError::ServiceStatus {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    let element = response
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| OracleError::MalformedResponse("no matrix element".to_string()))?;

    if element.status != "OK" {
        return Err(OracleError::ElementStatus(element.status));
    }

    let distance = element
        .distance
        .ok_or_else(|| OracleError::MalformedResponse("element without distance".to_string()))?;
    let duration = element
        .duration_in_traffic
        .or(element.duration)
        .ok_or_else(|| OracleError::MalformedResponse("element without duration".to_string()))?;

    Ok(LiveMeasurement {
        distance_m: distance.value.max(0.0).round() as u64,
        duration_s: duration.value.max(0.0).round() as u64,
        duration_text: duration.text,
    })
}

#[async_trait]
impl DistanceProvider for GoogleDistanceMatrix {
    fn name(&self) -> &'static str {
        "google_distance_matrix"
    }

    async fn measure(
        &self,
        origin: &Place,
        destination: &Place,
        mode: TravelMode,
    ) -> Result<LiveMeasurement, OracleError> {
        let origins = origin.to_query();
        let destinations = destination.to_query();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", mode.as_str()),
                ("units", "metric"),
                ("departure_time", "now"),
                ("traffic_model", "best_guess"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Upstream(status.as_u16()));
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|err| OracleError::MalformedResponse(err.to_string()))?;

        debug!(origins = %origins, destinations = %destinations, status = %body.status, "distance matrix response");
        parse_matrix_response(body)
    }
}
