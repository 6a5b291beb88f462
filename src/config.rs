// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and handed to every service
//! constructor; nothing reads the environment after that.

use crate::models::Coordinates;
use std::env;

const DEFAULT_STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
const DEFAULT_STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org";
const DEFAULT_CALENDAR_BASE_URL: &str = "https://api.trainerroad.com/v1/calendar/ics";

/// Gear identifiers the rules tag activities with.
#[derive(Debug, Clone, PartialEq)]
pub struct GearConfig {
    /// Indoor trainer (Tacx Neo 2T)
    pub trainer: String,
    /// Outdoor road bike
    pub bike: String,
    /// Walking shoes
    pub walking_shoes: String,
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            trainer: "b9880609".to_string(),
            bike: "b10013574".to_string(),
            walking_shoes: "g10043849".to_string(),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    // --- Strava ---
    pub strava_client_id: String,
    pub strava_client_secret: String,
    /// Token echoed back during the webhook subscription handshake
    pub webhook_verify_token: String,
    /// When set, events from any other subscription are rejected
    pub strava_subscription_id: Option<u64>,
    pub strava_api_url: String,
    pub strava_token_url: String,

    // --- Storage ---
    /// GCP project for Firestore. `None` selects the in-memory store.
    pub gcp_project_id: Option<String>,

    // --- OpenWeatherMap ---
    pub openweather_api_key: String,
    pub openweather_url: String,
    /// Where indoor and GPS-less activities happen
    pub home: Coordinates,

    // --- TrainerRoad calendar ---
    pub calendar_base_url: String,
    /// `None` disables calendar lookups
    pub calendar_id: Option<String>,

    /// Timeout applied to every outbound call and to inbound requests
    pub http_timeout_secs: u64,
    /// Process events even when they match the de-dup marker (`ENV=dev`)
    pub reprocess_duplicates: bool,
    /// Compute and log updates without writing anything (`DEBUG=1`)
    pub dry_run: bool,

    pub gear: GearConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let home = Coordinates {
            lat: parse_var("OWM_LAT")?.ok_or(ConfigError::Missing("OWM_LAT"))?,
            lon: parse_var("OWM_LON")?.ok_or(ConfigError::Missing("OWM_LON"))?,
        };

        let defaults = GearConfig::default();

        Ok(Self {
            port: parse_var("PORT")?.unwrap_or(8080),
            strava_client_id: required("STRAVA_CLIENT_ID")?,
            strava_client_secret: required("STRAVA_CLIENT_SECRET")?,
            webhook_verify_token: required("STRAVA_VERIFY_TOKEN")?,
            strava_subscription_id: parse_var("STRAVA_SUBSCRIPTION_ID")?,
            strava_api_url: env::var("STRAVA_API_URL")
                .unwrap_or_else(|_| DEFAULT_STRAVA_API_URL.to_string()),
            strava_token_url: env::var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_STRAVA_TOKEN_URL.to_string()),
            gcp_project_id: optional("GCP_PROJECT_ID"),
            openweather_api_key: required("OWM_API_KEY")?,
            openweather_url: env::var("OWM_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_URL.to_string()),
            home,
            calendar_base_url: env::var("TRAINERROAD_CAL_URL")
                .unwrap_or_else(|_| DEFAULT_CALENDAR_BASE_URL.to_string()),
            calendar_id: optional("TRAINERROAD_CAL_ID"),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS")?.unwrap_or(10),
            reprocess_duplicates: env::var("ENV").is_ok_and(|v| v == "dev"),
            dry_run: env::var("DEBUG").is_ok_and(|v| v == "1"),
            gear: GearConfig {
                trainer: optional("TRAINER_GEAR_ID").unwrap_or(defaults.trainer),
                bike: optional("BIKE_GEAR_ID").unwrap_or(defaults.bike),
                walking_shoes: optional("WALKING_GEAR_ID").unwrap_or(defaults.walking_shoes),
            },
        })
    }

    /// Config for tests: every external service points at localhost.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            webhook_verify_token: "test_verify_token".to_string(),
            strava_subscription_id: None,
            strava_api_url: "http://127.0.0.1:9/api/v3".to_string(),
            strava_token_url: "http://127.0.0.1:9/oauth/token".to_string(),
            gcp_project_id: None,
            openweather_api_key: "test_owm_key".to_string(),
            openweather_url: "http://127.0.0.1:9".to_string(),
            home: Coordinates {
                lat: 51.509865,
                lon: -0.118092,
            },
            calendar_base_url: "http://127.0.0.1:9/v1/calendar/ics".to_string(),
            calendar_id: None,
            http_timeout_secs: 5,
            reprocess_duplicates: false,
            dry_run: false,
            gear: GearConfig::default(),
        }
    }

    /// Full URL of the TrainerRoad calendar feed, if one is configured.
    pub fn calendar_url(&self) -> Option<String> {
        self.calendar_id.as_ref().map(|id| {
            format!("{}/{}", self.calendar_base_url.trim_end_matches('/'), id)
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match optional(name) {
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid(name)),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
