//! Year-to-date elevation totals ("summits").

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::Discipline;

/// Disciplines whose elevation gain is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummitDiscipline {
    Run,
    Ride,
}

impl SummitDiscipline {
    /// `None` for disciplines outside the tracked set.
    pub fn from_discipline(discipline: &Discipline) -> Option<Self> {
        match discipline {
            Discipline::Run => Some(SummitDiscipline::Run),
            Discipline::Ride => Some(SummitDiscipline::Ride),
            _ => None,
        }
    }
}

/// Cumulative elevation gain for one athlete in one calendar year.
///
/// Stored at: `summits/{athlete_id}_{year}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summit {
    pub athlete_id: u64,
    pub year: i32,
    /// Meters climbed running
    #[serde(default)]
    pub run: f64,
    /// Meters climbed riding
    #[serde(default)]
    pub ride: f64,
    /// Activities already counted (for duplicate detection)
    #[serde(default)]
    pub activity_ids: HashSet<u64>,
    #[serde(default)]
    pub updated_at: String,
}

impl Summit {
    pub fn new(athlete_id: u64, year: i32) -> Self {
        Self {
            athlete_id,
            year,
            run: 0.0,
            ride: 0.0,
            activity_ids: HashSet::new(),
            updated_at: String::new(),
        }
    }

    pub fn document_id(athlete_id: u64, year: i32) -> String {
        format!("{}_{}", athlete_id, year)
    }

    /// Add an activity's elevation gain.
    ///
    /// Returns `false` if the activity was already counted.
    pub fn add(
        &mut self,
        activity_id: u64,
        discipline: SummitDiscipline,
        elevation_gain: f64,
        now: &str,
    ) -> bool {
        if !self.activity_ids.insert(activity_id) {
            return false;
        }

        // Elevation gain is never negative; guard against bad data shrinking totals.
        let gain = elevation_gain.max(0.0);
        match discipline {
            SummitDiscipline::Run => self.run += gain,
            SummitDiscipline::Ride => self.ride += gain,
        }
        self.updated_at = now.to_string();
        true
    }

    pub fn total(&self, discipline: SummitDiscipline) -> f64 {
        match discipline {
            SummitDiscipline::Run => self.run,
            SummitDiscipline::Ride => self.ride,
        }
    }
}

/// Year-to-date total handed to the description renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummitTotal {
    pub discipline: SummitDiscipline,
    pub year: i32,
    /// Meters
    pub total: f64,
}
