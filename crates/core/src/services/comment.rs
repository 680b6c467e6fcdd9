//! Comment service.
//!
//! Comments hang off live incidents and carry exactly one author column,
//! matching the identity class of the poster. Posting feeds the author's
//! comment count into the achievement engine.

use chrono::Utc;
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::comment;
use safepoint_db::repositories::{
    CommentRepository, IdentityRepository, IncidentRepository, PersonClass, PersonRecord,
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::achievement::AchievementService;
use super::authorization::RequesterClaim;

/// Input for posting a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct PostCommentInput {
    pub incident_id: i32,

    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct EditCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// A comment with its author resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub incident_id: i32,
    pub body: String,
    pub author_id: String,
    pub author_username: String,
    pub author_role: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    incident_repo: IncidentRepository,
    identity_repo: IdentityRepository,
    achievement: AchievementService,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        incident_repo: IncidentRepository,
        identity_repo: IdentityRepository,
        achievement: AchievementService,
    ) -> Self {
        Self {
            comment_repo,
            incident_repo,
            identity_repo,
            achievement,
        }
    }

    /// Post a comment as the requester.
    ///
    /// The requester id is resolved against the reporter, administrator and
    /// moderator stores in that order; the first hit decides which author
    /// column is set.
    pub async fn post(
        &self,
        claim: &RequesterClaim,
        input: PostCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        self.incident_repo.get_by_id(input.incident_id).await?;

        let author = self
            .resolve_author(&claim.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let mut model = comment::ActiveModel {
            incident_id: Set(input.incident_id),
            reporter_id: Set(None),
            moderator_id: Set(None),
            administrator_id: Set(None),
            body: Set(input.body),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        match &author {
            PersonRecord::Reporter(m) => model.reporter_id = Set(Some(m.id.clone())),
            PersonRecord::Moderator(m) => model.moderator_id = Set(Some(m.id.clone())),
            PersonRecord::Administrator(m) => model.administrator_id = Set(Some(m.id.clone())),
        }

        let created = self.comment_repo.create(model).await?;

        // Only reporters collect the comment badge.
        if let PersonRecord::Reporter(m) = &author {
            if let Err(e) = self.achievement.evaluate_reporter_comments(&m.id).await {
                tracing::warn!("Badge evaluation failed for reporter {}: {e}", m.id);
            }
        }

        Ok(created)
    }

    /// List an incident's comments with their authors, oldest first.
    pub async fn list(&self, incident_id: i32) -> AppResult<Vec<CommentView>> {
        self.incident_repo.get_by_id(incident_id).await?;

        let mut views = Vec::new();
        for comment in self.comment_repo.find_by_incident(incident_id).await? {
            views.push(self.to_view(comment).await?);
        }
        Ok(views)
    }

    /// Edit a comment. Only its author may.
    pub async fn edit(
        &self,
        claim: &RequesterClaim,
        comment_id: i32,
        input: EditCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if author_id(&comment) != Some(claim.id.as_str()) {
            return Err(AppError::Forbidden("not your comment".into()));
        }

        let mut active = comment.into_active_model();
        active.body = Set(input.body);
        self.comment_repo.update(active).await
    }

    /// Delete a comment. Only its author may.
    pub async fn delete(&self, claim: &RequesterClaim, comment_id: i32) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if author_id(&comment) != Some(claim.id.as_str()) {
            return Err(AppError::Forbidden("not your comment".into()));
        }
        self.comment_repo.delete(comment).await
    }

    async fn resolve_author(&self, id: &str) -> AppResult<Option<PersonRecord>> {
        for class in [
            PersonClass::Reporter,
            PersonClass::Administrator,
            PersonClass::Moderator,
        ] {
            if let Some(record) = self.identity_repo.find_in_class(class, id).await? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    async fn to_view(&self, comment: comment::Model) -> AppResult<CommentView> {
        let (author_id, author_username, author_role) = match author_id(&comment) {
            Some(id) => match self.resolve_author(id).await? {
                Some(PersonRecord::Reporter(m)) => (m.id, m.username, "Reporter".to_string()),
                Some(PersonRecord::Moderator(m)) => (m.id, m.username, "Moderator".to_string()),
                Some(PersonRecord::Administrator(m)) => (m.id, m.username, "Admin".to_string()),
                // Author row gone; keep the comment readable.
                None => (id.to_string(), "deleted account".to_string(), String::new()),
            },
            None => (String::new(), "unknown".to_string(), String::new()),
        };

        Ok(CommentView {
            id: comment.id,
            incident_id: comment.incident_id,
            body: comment.body,
            author_id,
            author_username,
            author_role,
            created_at: comment.created_at,
        })
    }
}

/// The single author id a comment carries, whichever class it is.
#[must_use]
pub fn author_id(comment: &comment::Model) -> Option<&str> {
    comment
        .reporter_id
        .as_deref()
        .or(comment.moderator_id.as_deref())
        .or(comment.administrator_id.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bare_comment() -> comment::Model {
        comment::Model {
            id: 1,
            incident_id: 10,
            reporter_id: None,
            moderator_id: None,
            administrator_id: None,
            body: "Confirmed, saw it this morning".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_author_id_picks_whichever_column_is_set() {
        let mut comment = bare_comment();
        assert_eq!(author_id(&comment), None);

        comment.moderator_id = Some("mod1".to_string());
        assert_eq!(author_id(&comment), Some("mod1"));

        comment.moderator_id = None;
        comment.administrator_id = Some("adm1".to_string());
        assert_eq!(author_id(&comment), Some("adm1"));
    }

    #[test]
    fn test_post_input_rejects_empty_body() {
        let input = PostCommentInput {
            incident_id: 1,
            body: String::new(),
        };
        assert!(input.validate().is_err());
    }
}
