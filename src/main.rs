// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strautomagically API Server
//!
//! Listens for Strava webhooks and updates new activities in place.

use std::sync::Arc;
use strautomagically::{config::Config, db::Db, services::WebhookProcessor, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        dry_run = config.dry_run,
        reprocess_duplicates = config.reprocess_duplicates,
        "Starting Strautomagically"
    );

    // Connect the athlete/summit store
    let db = Db::connect(config.gcp_project_id.as_deref())
        .await
        .expect("Failed to connect to database");

    let processor =
        WebhookProcessor::new(&config, db).expect("Failed to initialize webhook processor");

    if config.calendar_id.is_none() {
        tracing::info!("TRAINERROAD_CAL_ID not set, ride titles will not use the calendar");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        processor,
    });

    // Build router
    let app = strautomagically::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strautomagically=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
