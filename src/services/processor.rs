// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook event processing.
//!
//! Handles the core workflow for a new activity:
//! 1. Skip events we already handled (de-dup marker)
//! 2. Refresh the athlete's Strava credential
//! 3. Fetch the activity
//! 4. Add its elevation to the year-to-date summit
//! 5. Gather calendar and weather lookups (failures only degrade)
//! 6. Run the rules and apply the resulting diff, if any
//! 7. Record the activity as the athlete's de-dup marker

use crate::config::Config;
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Activity, Coordinates, SummitTotal, WebhookEvent};
use crate::services::calendar::CalendarService;
use crate::services::rules::{Lookups, RuleEngine, WeatherLocation};
use crate::services::strava::{StravaClient, StravaService};
use crate::services::summit::SummitTracker;
use crate::services::weather::WeatherService;
use chrono::Datelike;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Per-athlete processing locks
type AthleteLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

/// What happened to a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Not an activity creation; nothing to do.
    Ignored,
    /// Already processed (matches the de-dup marker).
    Duplicate,
    /// Rules produced an empty diff.
    NoChanges,
    Updated { reason: String },
    /// Dry run: the diff was computed and logged but not applied.
    DryRun { reason: String },
}

/// Drives one webhook event through the enrichment pipeline.
#[derive(Clone)]
pub struct WebhookProcessor {
    db: Db,
    strava: StravaService,
    weather: WeatherService,
    calendar: CalendarService,
    summits: SummitTracker,
    rules: RuleEngine,
    home: Coordinates,
    subscription_id: Option<u64>,
    reprocess_duplicates: bool,
    dry_run: bool,
    locks: AthleteLocks,
}

impl WebhookProcessor {
    pub fn new(config: &Config, db: Db) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let client = StravaClient::new(
            &config.strava_api_url,
            &config.strava_token_url,
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
            timeout,
        )?;

        Ok(Self {
            strava: StravaService::new(client, db.clone()),
            weather: WeatherService::new(
                &config.openweather_url,
                config.openweather_api_key.clone(),
                timeout,
            )?,
            calendar: CalendarService::new(config.calendar_url(), timeout)?,
            summits: SummitTracker::new(db.clone()),
            rules: RuleEngine::new(config.gear.clone()),
            home: config.home,
            subscription_id: config.strava_subscription_id,
            reprocess_duplicates: config.reprocess_duplicates,
            dry_run: config.dry_run,
            locks: Arc::new(DashMap::new()),
            db,
        })
    }

    /// Process a single webhook event.
    ///
    /// Errors before the remote update leave the de-dup marker untouched so
    /// a redelivery retries the whole event.
    pub async fn handle(&self, event: &WebhookEvent) -> Result<ProcessOutcome> {
        if let Some(expected) = self.subscription_id {
            if event.subscription_id != expected {
                tracing::warn!(
                    received_id = event.subscription_id,
                    expected_id = expected,
                    "Security Alert: Webhook subscription ID mismatch"
                );
                return Err(AppError::Forbidden("Unknown subscription".to_string()));
            }
        }

        if !event.is_activity_create() {
            tracing::info!(
                object_type = %event.object_type,
                aspect_type = %event.aspect_type,
                "Ignoring non-create webhook"
            );
            return Ok(ProcessOutcome::Ignored);
        }

        let athlete_id = event.owner_id;
        let activity_id = event.object_id;

        // Marker check through marker write must not interleave for one athlete.
        let lock = self
            .locks
            .entry(athlete_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let athlete = self
            .db
            .get_athlete(athlete_id)
            .await?
            .ok_or(AppError::UnknownAthlete(athlete_id))?;

        if !self.reprocess_duplicates && athlete.last_activity_id == Some(activity_id) {
            tracing::info!(athlete_id, activity_id, "Ignoring repeat event");
            return Ok(ProcessOutcome::Duplicate);
        }

        let access_token = self.strava.get_valid_access_token(athlete_id).await?;

        let activity = self
            .strava
            .get_activity(&access_token, activity_id)
            .await
            .inspect_err(|e| {
                if e.is_strava_token_error() {
                    tracing::warn!(athlete_id, "Stored credential rejected by Strava");
                }
            })?;

        tracing::info!(
            athlete_id,
            activity_id,
            name = %activity.name,
            activity_type = %activity.activity_type,
            "Activity received"
        );

        let summit = self.track_summit(athlete_id, &activity).await;
        let lookups = self.gather_lookups(&activity, summit).await;
        let decision = self.rules.decide(&activity, &lookups);

        if self.dry_run {
            tracing::info!(
                athlete_id,
                activity_id,
                update = ?decision.update,
                reason = %decision.reason,
                "Dry run, not updating activity"
            );
            return Ok(ProcessOutcome::DryRun {
                reason: decision.reason,
            });
        }

        let outcome = if decision.update.is_empty() {
            tracing::info!(athlete_id, activity_id, "No activity changes");
            ProcessOutcome::NoChanges
        } else {
            let updated = self
                .strava
                .update_activity(&access_token, activity_id, &decision.update)
                .await?;
            tracing::info!(
                athlete_id,
                activity_id,
                name = %updated.name,
                reason = %decision.reason,
                "Activity updated"
            );
            ProcessOutcome::Updated {
                reason: decision.reason,
            }
        };

        // The remote activity is already updated; a redelivery would only repeat it.
        if let Err(e) = self.db.set_last_activity(athlete_id, activity_id).await {
            tracing::error!(
                athlete_id,
                activity_id,
                error = %e,
                "Failed to record processed activity after update"
            );
        }

        Ok(outcome)
    }

    /// Add the activity's climb to the summit and read the total back.
    async fn track_summit(&self, athlete_id: u64, activity: &Activity) -> Option<SummitTotal> {
        let discipline = activity.discipline();
        let year = activity.start_date_local.year();

        if !self.dry_run {
            if let Err(e) = self
                .summits
                .update(
                    athlete_id,
                    year,
                    &discipline,
                    activity.id,
                    activity.total_elevation_gain,
                )
                .await
            {
                tracing::warn!(athlete_id, activity_id = activity.id, error = %e, "Summit update failed");
            }
        }

        match self.summits.read(athlete_id, year, &discipline).await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(athlete_id, error = %e, "Summit read failed");
                None
            }
        }
    }

    async fn gather_lookups(&self, activity: &Activity, summit: Option<SummitTotal>) -> Lookups {
        let calendar_event = if RuleEngine::needs_calendar(activity) {
            match self
                .calendar
                .lookup(activity.start_date_local.date_naive(), activity.utc_offset())
                .await
            {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(activity_id = activity.id, error = %e, "Calendar lookup failed");
                    None
                }
            }
        } else {
            None
        };

        let weather = match RuleEngine::weather_location(activity) {
            Some(location) => {
                let coordinates = match location {
                    WeatherLocation::Home => self.home,
                    WeatherLocation::Gps(coordinates) => coordinates,
                };
                match self
                    .weather
                    .sample(activity.start_date, activity.elapsed_time, coordinates)
                    .await
                {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::warn!(activity_id = activity.id, error = %e, "Weather lookup failed");
                        None
                    }
                }
            }
            None => None,
        };

        Lookups {
            calendar_event,
            weather,
            summit,
        }
    }
}
