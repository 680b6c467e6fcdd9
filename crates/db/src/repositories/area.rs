//! Area repository.

use std::sync::Arc;

use crate::entities::{Area, area};
use crate::is_unique_violation;
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

/// Area repository for database operations.
#[derive(Clone)]
pub struct AreaRepository {
    db: Arc<DatabaseConnection>,
}

impl AreaRepository {
    /// Create a new area repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an area by code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<area::Model>> {
        Area::find_by_id(code)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an area by code, returning an error if not found.
    pub async fn get_by_code(&self, code: &str) -> AppResult<area::Model> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("area {code}")))
    }

    /// List all areas ordered by code.
    pub async fn find_all(&self) -> AppResult<Vec<area::Model>> {
        Area::find()
            .order_by_asc(area::Column::Code)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new area.
    pub async fn create(&self, model: area::ActiveModel) -> AppResult<area::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an area.
    pub async fn update(&self, model: area::ActiveModel) -> AppResult<area::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the area with the given code, creating it if missing.
    ///
    /// Insert first, and on a unique violation re-read the row the
    /// concurrent winner created.
    pub async fn ensure(&self, code: &str, name: &str) -> AppResult<area::Model> {
        if let Some(existing) = self.find_by_code(code).await? {
            return Ok(existing);
        }

        let active = area::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
        };

        match active.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => self.get_by_code(code).await,
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_area(code: &str, name: &str) -> area::Model {
        area::Model {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_returns_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_area("NORTH", "North District")]])
                .into_connection(),
        );

        let repo = AreaRepository::new(db);
        let area = repo.ensure("NORTH", "North District").await.unwrap();

        assert_eq!(area.code, "NORTH");
    }

    #[tokio::test]
    async fn test_ensure_creates_when_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<area::Model>::new()])
                .append_query_results([[test_area("DEFAULT", "Unassigned")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AreaRepository::new(db);
        let area = repo.ensure("DEFAULT", "Unassigned").await.unwrap();

        assert_eq!(area.code, "DEFAULT");
        assert_eq!(area.name, "Unassigned");
    }
}
