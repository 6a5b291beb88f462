// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at `gcloud emulators firestore start`.
//!
//! The emulator provides a clean state for each test run.

use chrono::{Duration, Utc};
use strautomagically::models::{Athlete, StoredToken, SummitDiscipline};

mod common;
use common::test_db;

/// Generate a unique athlete ID for test isolation.
fn unique_athlete_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn test_athlete(athlete_id: u64) -> Athlete {
    Athlete {
        strava_athlete_id: athlete_id,
        name: "Test Athlete".to_string(),
        last_activity_id: None,
        created_at: Utc::now().to_rfc3339(),
        updated_at: Utc::now().to_rfc3339(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ATHLETE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_athlete_roundtrip_and_marker() {
    require_emulator!();

    let db = test_db().await;
    let athlete_id = unique_athlete_id();

    assert!(db.get_athlete(athlete_id).await.unwrap().is_none());

    db.upsert_athlete(&test_athlete(athlete_id)).await.unwrap();
    db.set_last_activity(athlete_id, 42).await.unwrap();

    let fetched = db.get_athlete(athlete_id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Test Athlete");
    assert_eq!(fetched.last_activity_id, Some(42));
}

#[tokio::test]
async fn test_marker_for_unknown_athlete_fails() {
    require_emulator!();

    let db = test_db().await;
    assert!(db.set_last_activity(unique_athlete_id(), 1).await.is_err());
}

// ═══════════════════════════════════════════════════════════════════════════
// TOKEN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tokens_overwrite() {
    require_emulator!();

    let db = test_db().await;
    let athlete_id = unique_athlete_id();

    let first = StoredToken {
        access_token: "a1".to_string(),
        refresh_token: "r1".to_string(),
        expires_at: Utc::now() + Duration::hours(6),
    };
    db.set_tokens(athlete_id, &first).await.unwrap();

    let second = StoredToken {
        access_token: "a2".to_string(),
        refresh_token: "r2".to_string(),
        expires_at: Utc::now() + Duration::hours(12),
    };
    db.set_tokens(athlete_id, &second).await.unwrap();

    let fetched = db.get_tokens(athlete_id).await.unwrap().unwrap();
    assert_eq!(fetched.access_token, "a2");
    assert_eq!(fetched.refresh_token, "r2");
}

// ═══════════════════════════════════════════════════════════════════════════
// SUMMIT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_summit_accumulates_per_discipline() {
    require_emulator!();

    let db = test_db().await;
    let athlete_id = unique_athlete_id();

    db.add_summit_elevation(athlete_id, 2024, 1, SummitDiscipline::Ride, 120.0)
        .await
        .unwrap();
    db.add_summit_elevation(athlete_id, 2024, 2, SummitDiscipline::Ride, 30.0)
        .await
        .unwrap();
    db.add_summit_elevation(athlete_id, 2024, 3, SummitDiscipline::Run, 55.0)
        .await
        .unwrap();

    let summit = db.get_summit(athlete_id, 2024).await.unwrap().unwrap();
    assert_eq!(summit.ride, 150.0);
    assert_eq!(summit.run, 55.0);
    assert_eq!(summit.activity_ids.len(), 3);

    // Other years are independent
    assert!(db.get_summit(athlete_id, 2023).await.unwrap().is_none());
}

#[tokio::test]
async fn test_summit_counts_activity_once() {
    require_emulator!();

    let db = test_db().await;
    let athlete_id = unique_athlete_id();

    db.add_summit_elevation(athlete_id, 2024, 7, SummitDiscipline::Run, 80.0)
        .await
        .unwrap();
    let again = db
        .add_summit_elevation(athlete_id, 2024, 7, SummitDiscipline::Run, 80.0)
        .await
        .unwrap();

    assert_eq!(again.run, 80.0);
}

#[tokio::test]
async fn test_summit_concurrent_writers_keep_every_increment() {
    require_emulator!();

    // Separate clients stand in for separate service instances, which do
    // not share the in-process athlete lock.
    let first = test_db().await;
    let second = test_db().await;
    let athlete_id = unique_athlete_id();

    let mut handles = Vec::new();
    for (i, db) in [first, second].into_iter().cycle().take(6).enumerate() {
        handles.push(tokio::spawn(async move {
            db.add_summit_elevation(athlete_id, 2024, i as u64 + 1, SummitDiscipline::Run, 10.0)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let db = test_db().await;
    let summit = db.get_summit(athlete_id, 2024).await.unwrap().unwrap();
    assert_eq!(summit.run, 60.0);
    assert_eq!(summit.activity_ids.len(), 6);
}
