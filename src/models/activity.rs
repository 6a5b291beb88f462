// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity snapshot and the sparse update we send back.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Activity category as declared by the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discipline {
    /// Never recorded for real; exercised by tests to prove unmatched types are left alone.
    Handcycle,
    Ride,
    VirtualRide,
    Rowing,
    Walk,
    WeightTraining,
    Run,
    Other(String),
}

impl Discipline {
    /// Indoor disciplines never have meaningful GPS.
    pub fn is_indoor(&self) -> bool {
        matches!(self, Discipline::VirtualRide)
    }
}

impl From<&str> for Discipline {
    fn from(value: &str) -> Self {
        match value {
            "Handcycle" => Discipline::Handcycle,
            "Ride" => Discipline::Ride,
            "VirtualRide" => Discipline::VirtualRide,
            "Rowing" => Discipline::Rowing,
            "Walk" => Discipline::Walk,
            "WeightTraining" => Discipline::WeightTraining,
            "Run" => Discipline::Run,
            other => Discipline::Other(other.to_string()),
        }
    }
}

/// Detailed activity as returned by `GET /activities/{id}`.
///
/// Only the fields the rules look at are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Legacy activity type ("Ride", "Walk", ...). Groups sport types such as
    /// GravelRide under Ride, which is what the rules want.
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub trainer: bool,
    #[serde(default)]
    pub commute: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub hide_from_home: bool,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: i64,
    pub start_date: DateTime<Utc>,
    /// Wall-clock start time where the activity happened. Strava marks it
    /// with a `Z` suffix even though it is not UTC.
    pub start_date_local: DateTime<Utc>,
    #[serde(default)]
    pub start_latlng: Option<Vec<f64>>,
    #[serde(default)]
    pub end_latlng: Option<Vec<f64>>,
    #[serde(default)]
    pub description: Option<String>,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub gear_id: Option<String>,
}

impl Activity {
    pub fn discipline(&self) -> Discipline {
        Discipline::from(self.activity_type.as_str())
    }

    /// Description text, empty when Strava returned none.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Start coordinate, absent for indoor or GPS-less activities.
    pub fn start_coordinates(&self) -> Option<Coordinates> {
        match self.start_latlng.as_deref() {
            Some([lat, lon, ..]) => Some(Coordinates {
                lat: *lat,
                lon: *lon,
            }),
            _ => None,
        }
    }

    /// Offset of the athlete's wall clock from UTC when the activity started.
    pub fn utc_offset(&self) -> FixedOffset {
        let seconds = (self.start_date_local - self.start_date).num_seconds();
        i32::try_from(seconds)
            .ok()
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn is_from_external_source(&self, prefix: &str) -> bool {
        self.external_id
            .as_deref()
            .is_some_and(|id| id.starts_with(prefix))
    }
}

/// Fields to change on an activity via `PUT /activities/{id}`.
///
/// `None` means "leave untouched" and is never serialized; `Some(false)` is
/// sent as an explicit `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gear_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_from_home: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_type: Option<String>,
}

impl ActivityUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ActivityUpdate::default()
    }

    /// Union with `other`; fields set in `other` win.
    pub fn merge(mut self, other: ActivityUpdate) -> Self {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.name, other.name);
        take(&mut self.description, other.description);
        take(&mut self.gear_id, other.gear_id);
        take(&mut self.trainer, other.trainer);
        take(&mut self.commute, other.commute);
        take(&mut self.hide_from_home, other.hide_from_home);
        take(&mut self.private, other.private);
        take(&mut self.sport_type, other.sport_type);
        self
    }
}
