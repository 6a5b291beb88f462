//! In-memory store used for local development and tests.
//!
//! Data lives only as long as the process.

use crate::error::AppError;
use crate::models::{Athlete, StoredToken, Summit, SummitDiscipline};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    athletes: Arc<DashMap<u64, Athlete>>,
    tokens: Arc<DashMap<u64, StoredToken>>,
    summits: Arc<DashMap<(u64, i32), Summit>>,
    /// When set, every write fails (simulates an unavailable database).
    read_only: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(AppError::Database("Store is read-only".to_string()));
        }
        Ok(())
    }

    pub fn get_athlete(&self, athlete_id: u64) -> Result<Option<Athlete>, AppError> {
        Ok(self.athletes.get(&athlete_id).map(|a| a.value().clone()))
    }

    pub fn upsert_athlete(&self, athlete: &Athlete) -> Result<(), AppError> {
        self.check_writable()?;
        self.athletes
            .insert(athlete.strava_athlete_id, athlete.clone());
        Ok(())
    }

    pub fn set_last_activity(&self, athlete_id: u64, activity_id: u64) -> Result<(), AppError> {
        self.check_writable()?;
        let mut athlete = self
            .athletes
            .get_mut(&athlete_id)
            .ok_or_else(|| AppError::NotFound(format!("Athlete {}", athlete_id)))?;
        athlete.last_activity_id = Some(activity_id);
        athlete.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    pub fn get_tokens(&self, athlete_id: u64) -> Result<Option<StoredToken>, AppError> {
        Ok(self.tokens.get(&athlete_id).map(|t| t.value().clone()))
    }

    pub fn set_tokens(&self, athlete_id: u64, tokens: &StoredToken) -> Result<(), AppError> {
        self.check_writable()?;
        self.tokens.insert(athlete_id, tokens.clone());
        Ok(())
    }

    pub fn get_summit(&self, athlete_id: u64, year: i32) -> Result<Option<Summit>, AppError> {
        Ok(self.summits.get(&(athlete_id, year)).map(|s| s.value().clone()))
    }

    pub fn add_summit_elevation(
        &self,
        athlete_id: u64,
        year: i32,
        activity_id: u64,
        discipline: SummitDiscipline,
        elevation_gain: f64,
    ) -> Result<Summit, AppError> {
        self.check_writable()?;
        let now = chrono::Utc::now().to_rfc3339();

        // The entry guard holds the shard lock, so find-or-create + add is atomic.
        let mut summit = self
            .summits
            .entry((athlete_id, year))
            .or_insert_with(|| Summit::new(athlete_id, year));
        summit.add(activity_id, discipline, elevation_gain, &now);
        Ok(summit.value().clone())
    }
}
