//! Reporter repository.

use std::sync::Arc;

use crate::entities::{Reporter, person_archive, reporter};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};

/// Reporter repository for database operations.
#[derive(Clone)]
pub struct ReporterRepository {
    db: Arc<DatabaseConnection>,
}

impl ReporterRepository {
    /// Create a new reporter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reporter by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<reporter::Model>> {
        Reporter::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reporter by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<reporter::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("reporter {id}")))
    }

    /// Find a reporter by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<reporter::Model>> {
        Reporter::find()
            .filter(reporter::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reporter by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<reporter::Model>> {
        Reporter::find()
            .filter(reporter::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all reporters, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<reporter::Model>> {
        Reporter::find()
            .order_by_desc(reporter::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new reporter.
    pub async fn create(&self, model: reporter::ActiveModel) -> AppResult<reporter::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a reporter.
    pub async fn update(&self, model: reporter::ActiveModel) -> AppResult<reporter::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reporter.
    pub async fn delete(&self, model: reporter::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reporter, writing the archive copy in the same transaction.
    pub async fn delete_with_archive(
        &self,
        model: reporter::Model,
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

    /// Count all reporters.
    pub async fn count(&self) -> AppResult<u64> {
        Reporter::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_reporter(id: &str, username: &str) -> reporter::Model {
        reporter::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            contact: "09171234567".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Test".to_string(),
            middle_name: None,
            last_name: "Reporter".to_string(),
            is_active: true,
            suspension_end_at: None,
            trust_score: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let reporter = create_test_reporter("rep1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reporter.clone()]])
                .into_connection(),
        );

        let repo = ReporterRepository::new(db);
        let result = repo.find_by_id("rep1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reporter::Model>::new()])
                .into_connection(),
        );

        let repo = ReporterRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let reporter = create_test_reporter("rep1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reporter.clone()]])
                .into_connection(),
        );

        let repo = ReporterRepository::new(db);
        let result = repo.find_by_username("alice").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "rep1");
    }

    #[tokio::test]
    async fn test_create_reporter() {
        let reporter = create_test_reporter("rep1", "newbie");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reporter.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReporterRepository::new(db);

        let active = reporter::ActiveModel {
            id: sea_orm::Set("rep1".to_string()),
            username: sea_orm::Set("newbie".to_string()),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.username, "newbie");
    }

    #[tokio::test]
    async fn test_delete_with_archive_runs_in_one_transaction() {
        let reporter = create_test_reporter("rep1", "leaver");

        let archived = person_archive::Model {
            id: 1,
            person_id: "rep1".to_string(),
            username: "leaver".to_string(),
            email: "leaver@example.com".to_string(),
            contact: Some("09171234567".to_string()),
            password_hash: "$argon2id$stub".to_string(),
            role: "Reporter".to_string(),
            is_active: true,
            suspension_end_at: None,
            deleted_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[archived.clone()]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 1,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = ReporterRepository::new(Arc::clone(&db));

        let archive = person_archive::ActiveModel {
            person_id: sea_orm::Set("rep1".to_string()),
            username: sea_orm::Set("leaver".to_string()),
            email: sea_orm::Set("leaver@example.com".to_string()),
            contact: sea_orm::Set(Some("09171234567".to_string())),
            password_hash: sea_orm::Set("$argon2id$stub".to_string()),
            role: sea_orm::Set("Reporter".to_string()),
            is_active: sea_orm::Set(true),
            suspension_end_at: sea_orm::Set(None),
            deleted_at: sea_orm::Set(Utc::now().into()),
            ..Default::default()
        };

        repo.delete_with_archive(reporter, archive).await.unwrap();

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1, "archive and delete share one transaction");
    }
}
