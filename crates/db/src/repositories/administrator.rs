//! Administrator repository.

use std::sync::Arc;

use crate::entities::{Administrator, administrator, person_archive};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

/// Administrator repository for database operations.
#[derive(Clone)]
pub struct AdministratorRepository {
    db: Arc<DatabaseConnection>,
}

impl AdministratorRepository {
    /// Create a new administrator repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an administrator by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<administrator::Model>> {
        Administrator::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an administrator by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<administrator::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("administrator {id}")))
    }

    /// Find an administrator by username.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<administrator::Model>> {
        Administrator::find()
            .filter(administrator::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an administrator by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<administrator::Model>> {
        Administrator::find()
            .filter(administrator::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all administrators, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<administrator::Model>> {
        Administrator::find()
            .order_by_desc(administrator::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new administrator.
    pub async fn create(
        &self,
        model: administrator::ActiveModel,
    ) -> AppResult<administrator::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an administrator.
    pub async fn update(
        &self,
        model: administrator::ActiveModel,
    ) -> AppResult<administrator::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an administrator.
    pub async fn delete(&self, model: administrator::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an administrator, writing the archive copy in the same transaction.
    pub async fn delete_with_archive(
        &self,
        model: administrator::Model,
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

    fn create_test_admin(id: &str, username: &str, superuser: bool) -> administrator::Model {
        administrator::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            contact: "09171234567".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Test".to_string(),
            middle_name: None,
            last_name: "Admin".to_string(),
            is_superuser: superuser,
            permissions: Some("ManageIncidents".to_string()),
            is_active: true,
            suspension_end_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let admin = create_test_admin("adm1", "root", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin.clone()]])
                .into_connection(),
        );

        let repo = AdministratorRepository::new(db);
        let result = repo.find_by_username("root").await.unwrap();

        assert!(result.is_some());
        assert!(result.unwrap().is_superuser);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<administrator::Model>::new()])
                .into_connection(),
        );

        let repo = AdministratorRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
