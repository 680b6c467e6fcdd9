//! Validation repository.

use std::sync::Arc;

use crate::entities::{Validation, validation};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Validation repository for database operations.
#[derive(Clone)]
pub struct ValidationRepository {
    db: Arc<DatabaseConnection>,
}

impl ValidationRepository {
    /// Create a new validation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the validation row for an incident.
    pub async fn find_by_incident(&self, incident_id: i32) -> AppResult<Option<validation::Model>> {
        Validation::find()
            .filter(validation::Column::IncidentId.eq(incident_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a validation row.
    pub async fn create(&self, model: validation::ActiveModel) -> AppResult<validation::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a validation row.
    pub async fn update(&self, model: validation::ActiveModel) -> AppResult<validation::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_by_incident() {
        let row = validation::Model {
            id: "val1".to_string(),
            incident_id: 7,
            status: true,
            decided_at: Some(chrono::Utc::now().into()),
            validator_id: Some("adm1".to_string()),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row.clone()]])
                .into_connection(),
        );

        let repo = ValidationRepository::new(db);
        let found = repo.find_by_incident(7).await.unwrap().unwrap();

        assert!(found.status);
        assert_eq!(found.incident_id, 7);
    }
}
