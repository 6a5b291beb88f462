// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use std::sync::Arc;
use strautomagically::config::Config;
use strautomagically::db::{Db, FirestoreDb, MemoryDb};
use strautomagically::models::{Athlete, StoredToken};
use strautomagically::routes::create_router;
use strautomagically::services::WebhookProcessor;
use strautomagically::AppState;
use tower::ServiceExt;

pub const ATHLETE_ID: u64 = 134815;
pub const ACCESS_TOKEN: &str = "access-123";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Config with every external service pointed at the mock server.
#[allow(dead_code)]
pub fn mock_config(server_url: &str) -> Config {
    Config {
        strava_api_url: format!("{}/api/v3", server_url),
        strava_token_url: format!("{}/oauth/token", server_url),
        openweather_url: server_url.to_string(),
        calendar_base_url: format!("{}/v1/calendar/ics", server_url),
        calendar_id: Some("cal-id".to_string()),
        ..Config::test_default()
    }
}

/// Test app backed by the in-memory store.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub memory: MemoryDb,
}

#[allow(dead_code)]
pub fn create_test_app(config: Config) -> TestApp {
    let memory = MemoryDb::new();
    let db = Db::Memory(memory.clone());
    let processor =
        WebhookProcessor::new(&config, db).expect("Failed to build processor");

    let state = Arc::new(AppState {
        config,
        processor,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        memory,
    }
}

/// Store a connected athlete with a token valid for another hour.
#[allow(dead_code)]
pub fn seed_athlete(memory: &MemoryDb, last_activity_id: Option<u64>) {
    let now = Utc::now().to_rfc3339();
    memory
        .upsert_athlete(&Athlete {
            strava_athlete_id: ATHLETE_ID,
            name: "Test Athlete".to_string(),
            last_activity_id,
            created_at: now.clone(),
            updated_at: now,
        })
        .unwrap();
    memory
        .set_tokens(
            ATHLETE_ID,
            &StoredToken {
                access_token: ACCESS_TOKEN.to_string(),
                refresh_token: "refresh-123".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            },
        )
        .unwrap();
}

/// Webhook body for a new activity owned by the seeded athlete.
#[allow(dead_code)]
pub fn create_event(activity_id: u64) -> serde_json::Value {
    serde_json::json!({
        "aspect_type": "create",
        "event_time": 1709276400,
        "object_id": activity_id,
        "object_type": "activity",
        "owner_id": ATHLETE_ID,
        "subscription_id": 120475,
        "updates": {}
    })
}

/// POST a raw body to /webhook.
#[allow(dead_code)]
pub async fn post_webhook(router: &axum::Router, body: impl Into<Body>) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

/// Strava activity JSON with sensible defaults.
#[allow(dead_code)]
pub fn activity_json(id: u64, kind: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "Morning Ride",
        "type": kind,
        "sport_type": kind,
        "external_id": null,
        "trainer": false,
        "commute": false,
        "private": false,
        "hide_from_home": false,
        "elapsed_time": 1800,
        "start_date": "2024-03-01T07:10:00Z",
        "start_date_local": "2024-03-01T07:10:00Z",
        "start_latlng": [51.5, -0.12],
        "end_latlng": [51.5, -0.12],
        "description": null,
        "total_elevation_gain": 100.0,
        "gear_id": null
    })
}

/// OpenWeatherMap timemachine response.
#[allow(dead_code)]
pub fn weather_json(temp: f64, description: &str) -> String {
    serde_json::json!({
        "lat": 51.5,
        "lon": -0.12,
        "data": [{
            "temp": temp,
            "feels_like": temp - 3.0,
            "humidity": 64,
            "wind_speed": 3.6,
            "wind_deg": 0,
            "weather": [{"main": "Clear", "description": description, "icon": "01d"}]
        }]
    })
    .to_string()
}

/// OpenWeatherMap air pollution response with clean air.
#[allow(dead_code)]
pub fn clean_air_json() -> String {
    serde_json::json!({
        "list": [{
            "main": {"aqi": 1},
            "components": {"co": 200.0, "no2": 5.0, "pm2_5": 3.0}
        }]
    })
    .to_string()
}
