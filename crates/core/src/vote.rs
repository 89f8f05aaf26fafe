//! Vote directions and targets.
//!
//! The client never holds a vote list; it submits a direction for a target
//! and re-reads the server's tally.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, UserId};

pub const VOTE_UP: &str = "upvote";
pub const VOTE_DOWN: &str = "downvote";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Upvote,
    Downvote,
}

impl VoteDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Upvote => VOTE_UP,
            VoteDirection::Downvote => VOTE_DOWN,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.to_ascii_lowercase().as_str() {
            VOTE_UP | "up" => Ok(VoteDirection::Upvote),
            VOTE_DOWN | "down" => Ok(VoteDirection::Downvote),
            _ => Err(CoreError::Validation(format!(
                "Invalid vote type '{raw}'. Must be '{VOTE_UP}' or '{VOTE_DOWN}'"
            ))),
        }
    }
}

impl std::fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Bug(DbId),
    Comment(DbId),
}

impl VoteTarget {
    pub fn kind(self) -> &'static str {
        match self {
            VoteTarget::Bug(_) => "bug",
            VoteTarget::Comment(_) => "comment",
        }
    }

    pub fn id(self) -> DbId {
        match self {
            VoteTarget::Bug(id) | VoteTarget::Comment(id) => id,
        }
    }
}

/// Body of `POST /api/votes/bug/{bugId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugVote {
    pub user_id: UserId,
    pub vote_type: VoteDirection,
}

/// Body of `POST /api/votes/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVote {
    pub user_id: UserId,
    pub comment_id: DbId,
    pub vote_type: VoteDirection,
}
