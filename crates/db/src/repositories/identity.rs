//! Cross-class identity repository.
//!
//! Accounts live in three separate tables (reporter, moderator,
//! administrator) but share one username/email namespace. Everything that
//! has to see all three at once lives here: uniqueness checks, ordered
//! lookups, and the atomic role migration.

use std::sync::Arc;

use crate::entities::{
    Administrator, Moderator, Reporter, administrator, moderator, reporter,
};
use safepoint_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    TransactionTrait,
};

/// The three identity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonClass {
    Reporter,
    Moderator,
    Administrator,
}

/// A resolved account from any of the three identity tables.
#[derive(Debug, Clone, PartialEq)]
pub enum PersonRecord {
    Reporter(reporter::Model),
    Moderator(moderator::Model),
    Administrator(administrator::Model),
}

impl PersonRecord {
    /// Account id regardless of class.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Reporter(m) => &m.id,
            Self::Moderator(m) => &m.id,
            Self::Administrator(m) => &m.id,
        }
    }

    /// Username regardless of class.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Reporter(m) => &m.username,
            Self::Moderator(m) => &m.username,
            Self::Administrator(m) => &m.username,
        }
    }

    /// Which table the record came from.
    #[must_use]
    pub const fn class(&self) -> PersonClass {
        match self {
            Self::Reporter(_) => PersonClass::Reporter,
            Self::Moderator(_) => PersonClass::Moderator,
            Self::Administrator(_) => PersonClass::Administrator,
        }
    }
}

/// A fully-built row for the destination class of a role migration.
#[derive(Debug, Clone)]
pub enum NewPerson {
    Reporter(reporter::ActiveModel),
    Moderator(moderator::ActiveModel),
    Administrator(administrator::ActiveModel),
}

/// Repository for operations spanning the three identity tables.
#[derive(Clone)]
pub struct IdentityRepository {
    db: Arc<DatabaseConnection>,
}

impl IdentityRepository {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a username is taken in any identity class.
    ///
    /// `exclude_id` skips the row under change so renames and migrations do
    /// not collide with themselves.
    pub async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<bool> {
        let mut query = Reporter::find().filter(reporter::Column::Username.eq(username));
        if let Some(id) = exclude_id {
            query = query.filter(reporter::Column::Id.ne(id));
        }
        if query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some()
        {
            return Ok(true);
        }

        let mut query = Moderator::find().filter(moderator::Column::Username.eq(username));
        if let Some(id) = exclude_id {
            query = query.filter(moderator::Column::Id.ne(id));
        }
        if query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some()
        {
            return Ok(true);
        }

        let mut query =
            Administrator::find().filter(administrator::Column::Username.eq(username));
        if let Some(id) = exclude_id {
            query = query.filter(administrator::Column::Id.ne(id));
        }
        Ok(query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// Check whether an email is taken in any identity class.
    pub async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let mut query = Reporter::find().filter(reporter::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(reporter::Column::Id.ne(id));
        }
        if query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some()
        {
            return Ok(true);
        }

        let mut query = Moderator::find().filter(moderator::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(moderator::Column::Id.ne(id));
        }
        if query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some()
        {
            return Ok(true);
        }

        let mut query = Administrator::find().filter(administrator::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(administrator::Column::Id.ne(id));
        }
        Ok(query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// Find an account by username, checking reporters, then administrators,
    /// then moderators.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<PersonRecord>> {
        if let Some(m) = Reporter::find()
            .filter(reporter::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Reporter(m)));
        }

        if let Some(m) = Administrator::find()
            .filter(administrator::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Administrator(m)));
        }

        if let Some(m) = Moderator::find()
            .filter(moderator::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Moderator(m)));
        }

        Ok(None)
    }

    /// Find an account by email, same lookup order as [`Self::find_by_username`].
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<PersonRecord>> {
        if let Some(m) = Reporter::find()
            .filter(reporter::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Reporter(m)));
        }

        if let Some(m) = Administrator::find()
            .filter(administrator::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Administrator(m)));
        }

        if let Some(m) = Moderator::find()
            .filter(moderator::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(Some(PersonRecord::Moderator(m)));
        }

        Ok(None)
    }

    /// Find an account by id within a specific class.
    pub async fn find_in_class(
        &self,
        class: PersonClass,
        id: &str,
    ) -> AppResult<Option<PersonRecord>> {
        match class {
            PersonClass::Reporter => Ok(Reporter::find_by_id(id)
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(PersonRecord::Reporter)),
            PersonClass::Moderator => Ok(Moderator::find_by_id(id)
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(PersonRecord::Moderator)),
            PersonClass::Administrator => Ok(Administrator::find_by_id(id)
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(PersonRecord::Administrator)),
        }
    }

    /// Move an account from one identity class to another atomically.
    ///
    /// Re-reads the source row inside the transaction, deletes it, and
    /// inserts the prepared destination row. If the source vanished (a
    /// concurrent migration won the race) the whole operation fails with
    /// `NotFound` and nothing is written.
    pub async fn migrate(
        &self,
        source_class: PersonClass,
        source_id: &str,
        target: NewPerson,
    ) -> AppResult<PersonRecord> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match source_class {
            PersonClass::Reporter => {
                let source = Reporter::find_by_id(source_id)
                    .one(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
                    .ok_or_else(|| AppError::NotFound(format!("reporter {source_id}")))?;
                source
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            PersonClass::Moderator => {
                let source = Moderator::find_by_id(source_id)
                    .one(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
                    .ok_or_else(|| AppError::NotFound(format!("moderator {source_id}")))?;
                source
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            PersonClass::Administrator => {
                let source = Administrator::find_by_id(source_id)
                    .one(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
                    .ok_or_else(|| AppError::NotFound(format!("administrator {source_id}")))?;
                source
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        let created = match target {
            NewPerson::Reporter(am) => PersonRecord::Reporter(
                am.insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            ),
            NewPerson::Moderator(am) => PersonRecord::Moderator(
                am.insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            ),
            NewPerson::Administrator(am) => PersonRecord::Administrator(
                am.insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            ),
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_reporter(id: &str, username: &str) -> reporter::Model {
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
    async fn test_username_taken_in_reporter_table() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_reporter("rep1", "alice")]])
                .into_connection(),
        );

        let repo = IdentityRepository::new(db);
        assert!(repo.username_taken("alice", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_username_free_in_all_tables() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reporter::Model>::new()])
                .append_query_results([Vec::<moderator::Model>::new()])
                .append_query_results([Vec::<administrator::Model>::new()])
                .into_connection(),
        );

        let repo = IdentityRepository::new(db);
        assert!(!repo.username_taken("nobody", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_username_hits_reporter_first() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_reporter("rep1", "alice")]])
                .into_connection(),
        );

        let repo = IdentityRepository::new(db);
        let found = repo.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(found.class(), PersonClass::Reporter);
        assert_eq!(found.id(), "rep1");
    }
}
