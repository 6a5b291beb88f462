// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Athletes (profile and de-dup marker)
//! - Tokens (OAuth credentials)
//! - Summits (per-year elevation totals)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Athlete, StoredToken, Summit, SummitDiscipline};
use futures_util::FutureExt;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Athlete Operations ──────────────────────────────────────

    pub async fn get_athlete(&self, athlete_id: u64) -> Result<Option<Athlete>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ATHLETES)
            .obj()
            .one(&athlete_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_athlete(&self, athlete: &Athlete) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ATHLETES)
            .document_id(athlete.strava_athlete_id.to_string())
            .object(athlete)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record the de-dup marker.
    ///
    /// Read-modify-write; callers serialize per athlete.
    pub async fn set_last_activity(
        &self,
        athlete_id: u64,
        activity_id: u64,
    ) -> Result<(), AppError> {
        let mut athlete = self
            .get_athlete(athlete_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Athlete {}", athlete_id)))?;

        athlete.last_activity_id = Some(activity_id);
        athlete.updated_at = chrono::Utc::now().to_rfc3339();
        self.upsert_athlete(&athlete).await
    }

    // ─── Token Operations ────────────────────────────────────────

    pub async fn get_tokens(&self, athlete_id: u64) -> Result<Option<StoredToken>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TOKENS)
            .obj()
            .one(&athlete_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_tokens(&self, athlete_id: u64, tokens: &StoredToken) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TOKENS)
            .document_id(athlete_id.to_string())
            .object(tokens)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Summit Operations ───────────────────────────────────────

    pub async fn get_summit(&self, athlete_id: u64, year: i32) -> Result<Option<Summit>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUMMITS)
            .obj()
            .one(&Summit::document_id(athlete_id, year))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find-or-create the summit row and add one activity's gain.
    ///
    /// The read happens inside the transaction, so a concurrent writer on
    /// the same row aborts the commit and the closure is retried with fresh
    /// data. The counted-activity set makes a repeated add a no-op.
    pub async fn add_summit_elevation(
        &self,
        athlete_id: u64,
        year: i32,
        activity_id: u64,
        discipline: SummitDiscipline,
        elevation_gain: f64,
    ) -> Result<Summit, AppError> {
        let doc_id = Summit::document_id(athlete_id, year);

        self.get_client()?
            .run_transaction(|db, transaction| {
                let doc_id = doc_id.clone();
                async move {
                    let current: Option<Summit> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::SUMMITS)
                        .obj()
                        .one(&doc_id)
                        .await?;

                    let mut summit = current.unwrap_or_else(|| Summit::new(athlete_id, year));
                    let now = chrono::Utc::now().to_rfc3339();

                    if !summit.add(activity_id, discipline, elevation_gain, &now) {
                        tracing::debug!(
                            athlete_id,
                            activity_id,
                            "Elevation already counted (idempotent skip)"
                        );
                        return Ok(summit);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::SUMMITS)
                        .document_id(&doc_id)
                        .object(&summit)
                        .add_to_transaction(transaction)?;

                    Ok(summit)
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Summit transaction failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        assert!(matches!(
            db.get_athlete(1).await,
            Err(AppError::Database(_))
        ));
        assert!(matches!(
            db.set_last_activity(1, 2).await,
            Err(AppError::Database(_))
        ));
    }
}
