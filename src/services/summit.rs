// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Year-to-date elevation tracking.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{Discipline, Summit, SummitDiscipline, SummitTotal};

/// Per-athlete, per-year cumulative elevation gain.
#[derive(Clone)]
pub struct SummitTracker {
    db: Db,
}

impl SummitTracker {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Add `elevation_gain` for this activity to the athlete's total for `year`.
    ///
    /// Disciplines that are not tracked are ignored and return `Ok(None)`.
    pub async fn update(
        &self,
        athlete_id: u64,
        year: i32,
        discipline: &Discipline,
        activity_id: u64,
        elevation_gain: f64,
    ) -> Result<Option<Summit>, AppError> {
        let Some(tracked) = SummitDiscipline::from_discipline(discipline) else {
            return Ok(None);
        };

        let summit = self
            .db
            .add_summit_elevation(athlete_id, year, activity_id, tracked, elevation_gain)
            .await?;

        tracing::debug!(
            athlete_id,
            year,
            activity_id,
            total = summit.total(tracked),
            "Summit updated"
        );

        Ok(Some(summit))
    }

    /// Current total for the discipline, or `None` if nothing was recorded
    /// for that year (or the discipline is not tracked).
    pub async fn read(
        &self,
        athlete_id: u64,
        year: i32,
        discipline: &Discipline,
    ) -> Result<Option<SummitTotal>, AppError> {
        let Some(tracked) = SummitDiscipline::from_discipline(discipline) else {
            return Ok(None);
        };

        Ok(self
            .db
            .get_summit(athlete_id, year)
            .await?
            .map(|summit| SummitTotal {
                discipline: tracked,
                year,
                total: summit.total(tracked),
            }))
    }
}
