//! Incident repository.

use std::sync::Arc;

use crate::entities::{
    Incident, Validation, incident, incident_archive, rejected_incident, validation,
};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::incident::Severity;

/// Incident repository for database operations.
#[derive(Clone)]
pub struct IncidentRepository {
    db: Arc<DatabaseConnection>,
}

impl IncidentRepository {
    /// Create a new incident repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an incident by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<incident::Model>> {
        Incident::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an incident by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<incident::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {id}")))
    }

    /// Find an incident together with its validation row.
    pub async fn find_with_validation(
        &self,
        id: i32,
    ) -> AppResult<Option<(incident::Model, Option<validation::Model>)>> {
        Incident::find_by_id(id)
            .find_also_related(Validation)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all incidents with their validation rows, newest first.
    pub async fn find_all_with_validation(
        &self,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        Incident::find()
            .find_also_related(Validation)
            .order_by_desc(incident::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List validated incidents, optionally narrowed by category codes and
    /// severity. This is the public feed.
    pub async fn find_validated(
        &self,
        categories: Option<&[String]>,
        severity: Option<Severity>,
    ) -> AppResult<Vec<incident::Model>> {
        let mut query = Incident::find()
            .join(JoinType::InnerJoin, incident::Relation::Validation.def())
            .filter(validation::Column::Status.eq(true));

        if let Some(codes) = categories {
            query = query.filter(incident::Column::CategoryCode.is_in(codes.to_vec()));
        }
        if let Some(sev) = severity {
            query = query.filter(incident::Column::Severity.eq(sev));
        }

        query
            .order_by_desc(incident::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a reporter's incidents with validation state, newest first.
    pub async fn find_by_reporter(
        &self,
        reporter_id: &str,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        Incident::find()
            .filter(incident::Column::ReporterId.eq(reporter_id))
            .find_also_related(Validation)
            .order_by_desc(incident::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List incidents in an area with validation state, newest first.
    pub async fn find_by_area(
        &self,
        area_code: &str,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        Incident::find()
            .filter(incident::Column::AreaCode.eq(area_code))
            .find_also_related(Validation)
            .order_by_desc(incident::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count incidents in an area.
    pub async fn count_by_area(&self, area_code: &str) -> AppResult<u64> {
        Incident::find()
            .filter(incident::Column::AreaCode.eq(area_code))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a reporter's validated incidents. Feeds the badge thresholds.
    pub async fn count_validated_by_reporter(&self, reporter_id: &str) -> AppResult<u64> {
        Incident::find()
            .join(JoinType::InnerJoin, incident::Relation::Validation.def())
            .filter(validation::Column::Status.eq(true))
            .filter(incident::Column::ReporterId.eq(reporter_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an incident together with its pending validation row.
    pub async fn create_with_validation(
        &self,
        model: incident::ActiveModel,
        validation_id: String,
    ) -> AppResult<incident::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pending = validation::ActiveModel {
            id: Set(validation_id),
            incident_id: Set(created.id),
            status: Set(false),
            decided_at: Set(None),
            validator_id: Set(None),
        };
        pending
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Update an incident.
    pub async fn update(&self, model: incident::ActiveModel) -> AppResult<incident::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reject an incident: write the snapshot, then remove the live row.
    ///
    /// The validation row and comments go with the incident via cascade.
    pub async fn reject(
        &self,
        incident: incident::Model,
        snapshot: rejected_incident::ActiveModel,
    ) -> AppResult<rejected_incident::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = snapshot
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        incident
            .delete(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Delete an incident, keeping an archive copy.
    pub async fn delete_with_archive(
        &self,
        incident: incident::Model,
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

        incident
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_incident(id: i32, reporter: &str, area: &str) -> incident::Model {
        incident::Model {
            id,
            reporter_id: reporter.to_string(),
            title: "Fallen tree".to_string(),
            category_code: "road".to_string(),
            other_hazard: None,
            severity: Severity::Moderate,
            occurred_at: Utc::now().into(),
            area_code: area.to_string(),
            description: "Blocking one lane".to_string(),
            image: None,
            latitude: Some(14.5995),
            longitude: Some(120.9842),
            location_address: Some("EDSA corner Main St".to_string()),
            is_resolved: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let incident = test_incident(7, "rep1", "NORTH");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[incident.clone()]])
                .into_connection(),
        );

        let repo = IncidentRepository::new(db);
        let result = repo.find_by_id(7).await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().title, "Fallen tree");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<incident::Model>::new()])
                .into_connection(),
        );

        let repo = IncidentRepository::new(db);
        let result = repo.get_by_id(99).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_validated_returns_feed() {
        let a = test_incident(1, "rep1", "NORTH");
        let b = test_incident(2, "rep2", "SOUTH");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a, b]])
                .into_connection(),
        );

        let repo = IncidentRepository::new(db);
        let result = repo.find_validated(None, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
