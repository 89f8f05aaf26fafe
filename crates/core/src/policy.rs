//! Authorization policy for bugs and comments.
//!
//! Pure decision functions over already-fetched data. Every function takes
//! the acting user as `Option<&User>`; `None` (no session) is denied
//! everything. The backend remains the source of truth, these checks only
//! decide which actions the client offers and attempts.

use crate::bug::Bug;
use crate::comment::Comment;
use crate::error::CoreError;
use crate::user::User;

// ---------------------------------------------------------------------------
// Bug policy
// ---------------------------------------------------------------------------

/// Moderators and the bug's author may edit it.
pub fn can_edit_bug(user: Option<&User>, bug: &Bug) -> bool {
    user.is_some_and(|u| u.is_moderator() || bug.is_authored_by(&u.id))
}

/// Moderators and the bug's author may delete it.
pub fn can_delete_bug(user: Option<&User>, bug: &Bug) -> bool {
    can_edit_bug(user, bug)
}

/// Anyone signed in except the author may vote, unless a vote by this user
/// on this bug is still in flight.
pub fn can_vote_bug(user: Option<&User>, bug: &Bug, vote_in_flight: bool) -> bool {
    user.is_some_and(|u| !bug.is_authored_by(&u.id)) && !vote_in_flight
}

/// Only the bug's author may accept an answer, and only before it is solved.
pub fn can_accept_comment(user: Option<&User>, bug: &Bug) -> bool {
    user.is_some_and(|u| bug.is_authored_by(&u.id)) && bug.status.accepts_answers()
}

/// Signed-in users may comment while the bug is not solved.
pub fn can_submit_comment(user: Option<&User>, bug: &Bug) -> bool {
    user.is_some() && bug.status.accepts_comments()
}

// ---------------------------------------------------------------------------
// Comment policy
// ---------------------------------------------------------------------------

/// Moderators and the comment's author may edit it.
pub fn can_edit_comment(user: Option<&User>, comment: &Comment) -> bool {
    user.is_some_and(|u| u.is_moderator() || comment.is_authored_by(&u.id))
}

/// Moderators and the comment's author may delete it.
pub fn can_delete_comment(user: Option<&User>, comment: &Comment) -> bool {
    can_edit_comment(user, comment)
}

/// Anyone signed in except the comment's author may vote on it.
pub fn can_vote_comment(user: Option<&User>, comment: &Comment) -> bool {
    user.is_some_and(|u| !comment.is_authored_by(&u.id))
}

/// The accept control shows for the bug author on unsolved bugs, on
/// comments that are not already accepted.
pub fn shows_accept_control(user: Option<&User>, bug: &Bug, comment: &Comment) -> bool {
    can_accept_comment(user, bug) && !comment.accepted
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Every bug-level action the viewer is offered, computed in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BugActions {
    pub edit: bool,
    pub delete: bool,
    pub vote: bool,
    pub accept_answers: bool,
    pub comment: bool,
}

impl BugActions {
    pub fn evaluate(user: Option<&User>, bug: &Bug, vote_in_flight: bool) -> Self {
        Self {
            edit: can_edit_bug(user, bug),
            delete: can_delete_bug(user, bug),
            vote: can_vote_bug(user, bug, vote_in_flight),
            accept_answers: can_accept_comment(user, bug),
            comment: can_submit_comment(user, bug),
        }
    }
}

/// Every comment-level action the viewer is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommentActions {
    pub edit: bool,
    pub delete: bool,
    pub vote: bool,
    pub accept: bool,
}

impl CommentActions {
    pub fn evaluate(user: Option<&User>, bug: &Bug, comment: &Comment) -> Self {
        Self {
            edit: can_edit_comment(user, comment),
            delete: can_delete_comment(user, comment),
            vote: can_vote_comment(user, comment),
            accept: shows_accept_control(user, bug, comment),
        }
    }
}

/// Turn a denied decision into a [`CoreError::Forbidden`] naming the action,
/// so the client can refuse before making a request.
pub fn require(allowed: bool, action: &str) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("Not allowed to {action}")))
    }
}

/// Like [`require`], but reports a missing session as unauthorized.
pub fn require_user<'a>(user: Option<&'a User>, action: &str) -> Result<&'a User, CoreError> {
    user.ok_or_else(|| CoreError::Unauthorized(format!("You must be logged in to {action}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
