//! Moderator repository.

use std::sync::Arc;

use crate::entities::{Moderator, moderator, person_archive};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};

/// Moderator repository for database operations.
#[derive(Clone)]
pub struct ModeratorRepository {
    db: Arc<DatabaseConnection>,
}

impl ModeratorRepository {
    /// Create a new moderator repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a moderator by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<moderator::Model>> {
        Moderator::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a moderator by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<moderator::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("moderator {id}")))
    }

    /// Find a moderator by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<moderator::Model>> {
        Moderator::find()
            .filter(moderator::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a moderator by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<moderator::Model>> {
        Moderator::find()
            .filter(moderator::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all moderators, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<moderator::Model>> {
        Moderator::find()
            .order_by_desc(moderator::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List moderators assigned to an area.
    pub async fn find_by_area(&self, area_code: &str) -> AppResult<Vec<moderator::Model>> {
        Moderator::find()
            .filter(moderator::Column::AreaCode.eq(area_code))
            .order_by_desc(moderator::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count moderators assigned to an area.
    pub async fn count_by_area(&self, area_code: &str) -> AppResult<u64> {
        Moderator::find()
            .filter(moderator::Column::AreaCode.eq(area_code))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new moderator.
    pub async fn create(&self, model: moderator::ActiveModel) -> AppResult<moderator::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a moderator.
    pub async fn update(&self, model: moderator::ActiveModel) -> AppResult<moderator::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a moderator.
    pub async fn delete(&self, model: moderator::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a moderator, writing the archive copy in the same transaction.
    pub async fn delete_with_archive(
        &self,
        model: moderator::Model,
        archive: person_archive::ActiveModel,
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

        model
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

    fn create_test_moderator(id: &str, username: &str, area: &str) -> moderator::Model {
        moderator::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            contact: "09171234567".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Test".to_string(),
            middle_name: None,
            last_name: "Moderator".to_string(),
            area_code: area.to_string(),
            is_active: true,
            suspension_end_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_area() {
        let mod1 = create_test_moderator("mod1", "north1", "NORTH");
        let mod2 = create_test_moderator("mod2", "north2", "NORTH");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mod1, mod2]])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        let result = repo.find_by_area("NORTH").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.area_code == "NORTH"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<moderator::Model>::new()])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
