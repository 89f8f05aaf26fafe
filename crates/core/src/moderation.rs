//! Moderator rights: cross-user edit/delete and user bans.
//!
//! A single authorized call executes immediately; there is no approval
//! chain. Bans carry a free-text reason, unbans carry nothing.

use serde::Serialize;

use crate::bug::Bug;
use crate::error::CoreError;
use crate::user::User;

/// Maximum length for a ban reason (characters).
pub const MAX_BAN_REASON_LENGTH: usize = 500;

pub fn is_moderator(user: Option<&User>) -> bool {
    user.is_some_and(User::is_moderator)
}

/// A moderator may ban or unban anyone but themselves.
pub fn can_ban(user: Option<&User>, target_user_id: &str) -> bool {
    user.is_some_and(|u| u.is_moderator() && u.id != target_user_id)
}

/// Whether an edit of `bug` by `user` goes through the moderator endpoint.
///
/// Authors edit their own bugs through the regular endpoint even when they
/// hold the moderator role.
pub fn edits_as_moderator(user: &User, bug: &Bug) -> bool {
    user.is_moderator() && !bug.is_authored_by(&user.id)
}

/// Body of `POST /api/moderation/users/{id}/ban/mods/{modId}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanRequest {
    pub reason: String,
}

impl BanRequest {
    /// Build a ban request, rejecting an empty or oversized reason.
    pub fn new(reason: &str) -> Result<Self, CoreError> {
        validate_ban_reason(reason)?;
        Ok(Self {
            reason: reason.trim().to_string(),
        })
    }
}

pub fn validate_ban_reason(reason: &str) -> Result<(), CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("A ban reason is required".into()));
    }
    let len = trimmed.chars().count();
    if len > MAX_BAN_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Ban reason exceeds maximum length of {MAX_BAN_REASON_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}
