//! Bug records, tags, and the status gate.
//!
//! Defines the three bug statuses, the rule that a solved bug takes no
//! new comments or accept decisions, and validation for report/edit forms.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{lenient_timestamp, null_as_default, DbId, Timestamp, UserId};
use crate::user::AuthorRef;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Initial status for a newly reported bug.
pub const STATUS_RECEIVED: &str = "Received";
/// Someone is working on the bug.
pub const STATUS_IN_PROGRESS: &str = "In progress";
/// The bug is resolved; comments and accept decisions are closed.
pub const STATUS_SOLVED: &str = "Solved";

/// All valid bug statuses.
pub const VALID_STATUSES: &[&str] = &[STATUS_RECEIVED, STATUS_IN_PROGRESS, STATUS_SOLVED];

// ---------------------------------------------------------------------------
// Validation constants
// ---------------------------------------------------------------------------

/// Maximum length for a bug title (characters).
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for a bug description (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// BugStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BugStatus {
    #[default]
    #[serde(rename = "Received")]
    Received,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Solved")]
    Solved,
}

impl BugStatus {
    pub const ALL: [BugStatus; 3] = [BugStatus::Received, BugStatus::InProgress, BugStatus::Solved];

    pub fn as_str(self) -> &'static str {
        match self {
            BugStatus::Received => STATUS_RECEIVED,
            BugStatus::InProgress => STATUS_IN_PROGRESS,
            BugStatus::Solved => STATUS_SOLVED,
        }
    }

    /// Parse a status string exactly as the backend spells it.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            STATUS_RECEIVED => Ok(BugStatus::Received),
            STATUS_IN_PROGRESS => Ok(BugStatus::InProgress),
            STATUS_SOLVED => Ok(BugStatus::Solved),
            _ => Err(CoreError::Validation(format!(
                "Invalid bug status '{raw}'. Must be one of: {:?}",
                VALID_STATUSES
            ))),
        }
    }

    pub fn is_solved(self) -> bool {
        self == BugStatus::Solved
    }

    /// Whether new comments may be submitted on a bug in this status.
    pub fn accepts_comments(self) -> bool {
        !self.is_solved()
    }

    /// Whether the bug author may still mark a comment as accepted.
    pub fn accepts_answers(self) -> bool {
        !self.is_solved()
    }
}

impl std::fmt::Display for BugStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BugStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns the statuses `from` may be set to by an authorized editor.
///
/// Status is not a strict pipeline: any state may be set to any other,
/// including re-opening a solved bug.
pub fn valid_transitions(from: BugStatus) -> Vec<BugStatus> {
    BugStatus::ALL
        .into_iter()
        .filter(|s| *s != from)
        .collect()
}

/// Refuse a new comment on a solved bug.
pub fn ensure_open_for_comments(bug: &Bug) -> Result<(), CoreError> {
    if bug.status.accepts_comments() {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Bug {} is solved and no longer accepts comments",
            bug.id
        )))
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
}

/// Association between a bug and a tag, in the order the backend returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    pub tag: Tag,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBugTag {
    Assoc {
        #[serde(default)]
        id: Option<DbId>,
        tag: Tag,
    },
    Bare(Tag),
}

impl<'de> Deserialize<'de> for BugTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawBugTag::deserialize(deserializer)? {
            RawBugTag::Assoc { id, tag } => BugTag { id, tag },
            RawBugTag::Bare(tag) => BugTag { id: None, tag },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: DbId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BugStatus,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Timestamp,
    pub author: AuthorRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: i64,
    #[serde(default, alias = "tags", deserialize_with = "null_as_default")]
    pub bug_tags: Vec<BugTag>,
}

impl Bug {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.bug_tags.iter().map(|bt| &bt.tag)
    }

    pub fn has_tag(&self, tag_id: DbId) -> bool {
        self.tags().any(|t| t.id == tag_id)
    }
}

// ---------------------------------------------------------------------------
// Form payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/bugs/report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBug {
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tag_ids: Vec<DbId>,
}

impl NewBug {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }
}

/// Body of a bug edit, by the author or a moderator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugUpdate {
    pub title: String,
    pub description: String,
    /// Always sent: `null` clears the image on the server.
    pub image: Option<String>,
    pub status: BugStatus,
}

impl BugUpdate {
    /// Pre-fill an edit form from the current bug.
    pub fn from_bug(bug: &Bug) -> Self {
        Self {
            title: bug.title.clone(),
            description: bug.description.clone(),
            image: bug.image.clone(),
            status: bug.status,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }
}

/// Treat a blank optional image URL as absent.
pub fn normalize_image(image: Option<String>) -> Option<String> {
    image
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Validate a bug title: required, bounded length.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title is required".into()));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate a bug description: required, bounded length.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("Description is required".into()));
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
