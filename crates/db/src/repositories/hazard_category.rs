//! Hazard category repository.

use std::sync::Arc;

use crate::entities::{HazardCategory, hazard_category};
use crate::is_unique_violation;
use safepoint_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

/// Hazard category repository for database operations.
#[derive(Clone)]
pub struct HazardCategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl HazardCategoryRepository {
    /// Create a new hazard category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<hazard_category::Model>> {
        HazardCategory::find_by_id(code)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by code, returning an error if not found.
    pub async fn get_by_code(&self, code: &str) -> AppResult<hazard_category::Model> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("hazard category {code}")))
    }

    /// List all categories ordered by code.
    pub async fn find_all(&self) -> AppResult<Vec<hazard_category::Model>> {
        HazardCategory::find()
            .order_by_asc(hazard_category::Column::Code)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the category with the given code, registering it if missing.
    ///
    /// Same insert-then-re-read race handling as the area repository.
    pub async fn ensure(
        &self,
        code: &str,
        label: Option<&str>,
    ) -> AppResult<hazard_category::Model> {
        if let Some(existing) = self.find_by_code(code).await? {
            return Ok(existing);
        }

        let active = hazard_category::ActiveModel {
            code: Set(code.to_string()),
            label: Set(label.map(ToString::to_string)),
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

    #[tokio::test]
    async fn test_ensure_registers_new_category() {
        let created = hazard_category::Model {
            code: "flood".to_string(),
            label: Some("Flooding".to_string()),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hazard_category::Model>::new()])
                .append_query_results([[created.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = HazardCategoryRepository::new(db);
        let category = repo.ensure("flood", Some("Flooding")).await.unwrap();

        assert_eq!(category.code, "flood");
        assert_eq!(category.label.as_deref(), Some("Flooding"));
    }
}
