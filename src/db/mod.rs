//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Athlete, StoredToken, Summit, SummitDiscipline};

/// Collection names as constants.
pub mod collections {
    pub const ATHLETES: &str = "athletes";
    pub const TOKENS: &str = "tokens";
    /// Per-athlete, per-year elevation totals (keyed by `{athlete_id}_{year}`)
    pub const SUMMITS: &str = "summits";
}

/// Athlete, credential and summit persistence.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Db {
    /// Connect to Firestore when a project is configured, otherwise fall back
    /// to the in-memory store.
    pub async fn connect(project_id: Option<&str>) -> Result<Self, AppError> {
        match project_id {
            Some(project_id) => Ok(Db::Firestore(FirestoreDb::new(project_id).await?)),
            None => {
                tracing::warn!("No GCP project configured, using in-memory store");
                Ok(Db::Memory(MemoryDb::new()))
            }
        }
    }

    pub async fn get_athlete(&self, athlete_id: u64) -> Result<Option<Athlete>, AppError> {
        match self {
            Db::Firestore(db) => db.get_athlete(athlete_id).await,
            Db::Memory(db) => db.get_athlete(athlete_id),
        }
    }

    pub async fn upsert_athlete(&self, athlete: &Athlete) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.upsert_athlete(athlete).await,
            Db::Memory(db) => db.upsert_athlete(athlete),
        }
    }

    /// Record `activity_id` as the athlete's de-dup marker.
    pub async fn set_last_activity(&self, athlete_id: u64, activity_id: u64) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.set_last_activity(athlete_id, activity_id).await,
            Db::Memory(db) => db.set_last_activity(athlete_id, activity_id),
        }
    }

    pub async fn get_tokens(&self, athlete_id: u64) -> Result<Option<StoredToken>, AppError> {
        match self {
            Db::Firestore(db) => db.get_tokens(athlete_id).await,
            Db::Memory(db) => db.get_tokens(athlete_id),
        }
    }

    pub async fn set_tokens(&self, athlete_id: u64, tokens: &StoredToken) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.set_tokens(athlete_id, tokens).await,
            Db::Memory(db) => db.set_tokens(athlete_id, tokens),
        }
    }

    pub async fn get_summit(&self, athlete_id: u64, year: i32) -> Result<Option<Summit>, AppError> {
        match self {
            Db::Firestore(db) => db.get_summit(athlete_id, year).await,
            Db::Memory(db) => db.get_summit(athlete_id, year),
        }
    }

    /// Find-or-create the summit row and add the activity's gain to it.
    ///
    /// Returns the row after the write.
    pub async fn add_summit_elevation(
        &self,
        athlete_id: u64,
        year: i32,
        activity_id: u64,
        discipline: SummitDiscipline,
        elevation_gain: f64,
    ) -> Result<Summit, AppError> {
        match self {
            Db::Firestore(db) => {
                db.add_summit_elevation(athlete_id, year, activity_id, discipline, elevation_gain)
                    .await
            }
            Db::Memory(db) => {
                db.add_summit_elevation(athlete_id, year, activity_id, discipline, elevation_gain)
            }
        }
    }
}
