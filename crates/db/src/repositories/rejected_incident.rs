//! Rejected incident repository.

use std::sync::Arc;

use crate::entities::{
    RejectedIncident, incident, incident_archive, rejected_incident, validation,
};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// Rejected incident repository for database operations.
#[derive(Clone)]
pub struct RejectedIncidentRepository {
    db: Arc<DatabaseConnection>,
}

impl RejectedIncidentRepository {
    /// Create a new rejected incident repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a snapshot by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<rejected_incident::Model>> {
        RejectedIncident::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a snapshot by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<rejected_incident::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rejected incident {id}")))
    }

    /// List all snapshots, most recently rejected first.
    pub async fn find_all(&self) -> AppResult<Vec<rejected_incident::Model>> {
        RejectedIncident::find()
            .order_by_desc(rejected_incident::Column::RejectedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List snapshots for an area, most recently rejected first.
    pub async fn find_by_area(&self, area_code: &str) -> AppResult<Vec<rejected_incident::Model>> {
        RejectedIncident::find()
            .filter(rejected_incident::Column::AreaCode.eq(area_code))
            .order_by_desc(rejected_incident::Column::RejectedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recover a snapshot into a fresh pending incident.
    ///
    /// Inserts the rebuilt incident, attaches a pending validation row with
    /// the supplied id, and deletes the snapshot, all in one transaction.
    /// Recovering an already-recovered snapshot fails with `NotFound`.
    pub async fn recover(
        &self,
        snapshot_id: i32,
        incident: incident::ActiveModel,
        validation_id: String,
    ) -> AppResult<incident::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let snapshot = RejectedIncident::find_by_id(snapshot_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("rejected incident {snapshot_id}")))?;

        let recovered = incident
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pending = validation::ActiveModel {
            id: Set(validation_id),
            incident_id: Set(recovered.id),
            status: Set(false),
            decided_at: Set(None),
            validator_id: Set(None),
        };
        pending
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        snapshot
            .delete(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recovered)
    }

    /// Permanently delete a snapshot, keeping an archive copy.
    pub async fn delete_permanently(
        &self,
        snapshot: rejected_incident::Model,
        archive: incident_archive::ActiveModel,
    ) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        archive
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        snapshot
            .delete(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::incident::Severity;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_snapshot(id: i32, original: i32) -> rejected_incident::Model {
        rejected_incident::Model {
            id,
            original_incident_id: original,
            reporter_id: "rep1".to_string(),
            title: "Pothole".to_string(),
            category_code: "road".to_string(),
            other_hazard: None,
            severity: Severity::Low,
            occurred_at: Utc::now().into(),
            area_code: "NORTH".to_string(),
            description: "Small pothole".to_string(),
            image: None,
            latitude: None,
            longitude: None,
            location_address: None,
            created_at: Utc::now().into(),
            rejector_id: Some("adm1".to_string()),
            rejected_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let snapshot = test_snapshot(3, 41);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[snapshot.clone()]])
                .into_connection(),
        );

        let repo = RejectedIncidentRepository::new(db);
        let found = repo.find_by_id(3).await.unwrap().unwrap();

        assert_eq!(found.original_incident_id, 41);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<rejected_incident::Model>::new()])
                .into_connection(),
        );

        let repo = RejectedIncidentRepository::new(db);
        let result = repo.get_by_id(99).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
