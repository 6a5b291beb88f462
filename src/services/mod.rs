// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aqi;
pub mod calendar;
pub mod processor;
pub mod rules;
pub mod strava;
pub mod summit;
pub mod weather;

pub use calendar::{CalendarEvent, CalendarService};
pub use processor::{ProcessOutcome, WebhookProcessor};
pub use rules::{Decision, Lookups, RuleEngine, WeatherLocation};
pub use strava::{StravaClient, StravaService};
pub use summit::SummitTracker;
pub use weather::{WeatherInfo, WeatherService};
