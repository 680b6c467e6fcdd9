//! Badge repository.

use std::sync::Arc;

use crate::entities::{Badge, badge};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Badge repository for database operations.
#[derive(Clone)]
pub struct BadgeRepository {
    db: Arc<DatabaseConnection>,
}

impl BadgeRepository {
    /// Create a new badge repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether a person already holds a badge.
    pub async fn exists(&self, person_id: &str, badge_name: &str) -> AppResult<bool> {
        Ok(Badge::find()
            .filter(badge::Column::PersonId.eq(person_id))
            .filter(badge::Column::BadgeName.eq(badge_name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// List a person's badges, most recent first.
    pub async fn find_by_person(&self, person_id: &str) -> AppResult<Vec<badge::Model>> {
        Badge::find()
            .filter(badge::Column::PersonId.eq(person_id))
            .order_by_desc(badge::Column::AwardedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a badge.
    pub async fn create(&self, model: badge::ActiveModel) -> AppResult<badge::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a badge from a person. Returns whether a row was deleted.
    pub async fn remove(&self, person_id: &str, badge_name: &str) -> AppResult<bool> {
        let Some(existing) = Badge::find()
            .filter(badge::Column::PersonId.eq(person_id))
            .filter(badge::Column::BadgeName.eq(badge_name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        else {
            return Ok(false);
        };

        existing
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_badge(id: i32, person: &str, name: &str) -> badge::Model {
        badge::Model {
            id,
            person_id: person.to_string(),
            badge_name: name.to_string(),
            awarded_at: Utc::now().into(),
            awarded_by: Some("System".to_string()),
        }
    }

    #[tokio::test]
    async fn test_exists_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_badge(1, "rep1", "Certified Reporter")]])
                .into_connection(),
        );

        let repo = BadgeRepository::new(db);
        assert!(repo.exists("rep1", "Certified Reporter").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<badge::Model>::new()])
                .into_connection(),
        );

        let repo = BadgeRepository::new(db);
        assert!(!repo.exists("rep1", "Top Contributor").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_badge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<badge::Model>::new()])
                .into_connection(),
        );

        let repo = BadgeRepository::new(db);
        assert!(!repo.remove("rep1", "Sociable").await.unwrap());
    }
}
