use std::env;

use crate::engine::compatibility::DEFAULT_LANDMARK;
use crate::engine::matcher::DEFAULT_MAX_DISTANCE_KM;
use crate::error::AppError;
use crate::oracle::google::DEFAULT_ENDPOINT;
use crate::oracle::retry::MAX_RETRIES_CEILING;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub maps_api_key: Option<String>,
    pub maps_distance_endpoint: String,
    pub default_max_distance_km: f64,
    pub oracle_timeout_ms: u64,
    pub oracle_max_retries: u32,
    pub oracle_cache: bool,
    pub landmark_keywords: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            maps_api_key: env::var("MAPS_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            maps_distance_endpoint: env::var("MAPS_DISTANCE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            default_max_distance_km: parse_or_default(
                "DEFAULT_MAX_DISTANCE_KM",
                DEFAULT_MAX_DISTANCE_KM,
            )?,
            oracle_timeout_ms: parse_or_default("ORACLE_TIMEOUT_MS", 5000)?,
            oracle_max_retries: parse_or_default("ORACLE_MAX_RETRIES", 2)?,
            oracle_cache: parse_or_default("ORACLE_CACHE", true)?,
            landmark_keywords: env::var("LANDMARK_KEYWORDS")
                .map(|raw| split_keywords(&raw))
                .unwrap_or_else(|_| vec![DEFAULT_LANDMARK.to_string()]),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.default_max_distance_km.is_finite() || self.default_max_distance_km < 0.0 {
            return Err(AppError::Internal(format!(
                "invalid DEFAULT_MAX_DISTANCE_KM: {}",
                self.default_max_distance_km
            )));
        }

        if self.oracle_max_retries > MAX_RETRIES_CEILING {
            return Err(AppError::Internal(format!(
                "invalid ORACLE_MAX_RETRIES: {} (at most {MAX_RETRIES_CEILING})",
                self.oracle_max_retries
            )));
        }

        if self.oracle_timeout_ms == 0 {
            return Err(AppError::Internal(
                "invalid ORACLE_TIMEOUT_MS: must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
