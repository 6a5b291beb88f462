// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strautomagically: tidy up new Strava activities automatically
//!
//! This crate receives Strava "activity created" webhooks, renames and
//! re-tags the new activity according to a fixed set of rules, and appends
//! the weather, air quality and year-to-date climbing to its description.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::WebhookProcessor;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub processor: WebhookProcessor,
}
