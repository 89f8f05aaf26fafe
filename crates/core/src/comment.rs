//! Comments on bugs and the single-accepted-answer invariant.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{lenient_timestamp, null_as_default, DbId, Timestamp, UserId};
use crate::user::AuthorRef;

/// Maximum length for comment text (characters).
pub const MAX_COMMENT_LENGTH: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DbId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Timestamp,
    pub author: AuthorRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accepted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: i64,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}

/// Body of `POST /api/comments/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub bug_id: DbId,
    pub author_id: UserId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_text(&self.text)
    }
}

/// Body of `PUT /api/comments/update/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdate {
    pub author_id: UserId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CommentUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_text(&self.text)
    }
}

/// Validate comment text: required, bounded length.
pub fn validate_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Comment text is required".into()));
    }
    let len = text.chars().count();
    if len > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// The accepted comment of a bug, if any.
pub fn accepted_comment(comments: &[Comment]) -> Option<&Comment> {
    comments.iter().find(|c| c.accepted)
}

/// Cross-check a freshly fetched comment list: at most one may be accepted.
pub fn ensure_single_accepted(bug_id: DbId, comments: &[Comment]) -> Result<(), CoreError> {
    let accepted: Vec<DbId> = comments.iter().filter(|c| c.accepted).map(|c| c.id).collect();
    if accepted.len() > 1 {
        return Err(CoreError::Conflict(format!(
            "Bug {bug_id} has {} accepted comments: {:?}",
            accepted.len(),
            accepted
        )));
    }
    Ok(())
}

/// Order comments newest first, as the thread view displays them.
pub fn sort_most_recent_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
