//! Connected athlete and their stored OAuth credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Athlete record, created when the athlete first authorizes the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    /// Strava athlete ID (also used as document ID)
    pub strava_athlete_id: u64,
    /// Display name
    pub name: String,
    /// Last activity processed for this athlete (de-dup marker)
    #[serde(default)]
    pub last_activity_id: Option<u64>,
    /// When the athlete first connected
    pub created_at: String,
    /// Last time the record changed
    pub updated_at: String,
}

/// Athlete's OAuth tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    /// True once the access token is within the refresh margin of expiring.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.expires_at
    }
}
