//! Well-known role names.
//!
//! These must match the role strings the backend stores on user accounts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_USER: &str = "USER";
pub const ROLE_MODERATOR: &str = "MODERATOR";

/// All valid role strings.
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_MODERATOR];

/// Account role. Anything other than `MODERATOR` carries plain user rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Role {
    #[default]
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "MODERATOR")]
    Moderator,
}

impl From<String> for Role {
    /// Lenient wire decoding: the backend stores whatever role the
    /// registration carried, so unknown names fall back to [`Role::User`].
    fn from(raw: String) -> Self {
        Role::parse(&raw).unwrap_or_default()
    }
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Moderator => ROLE_MODERATOR,
        }
    }

    /// Parse a role string, accepting the `ROLE_` prefix the backend
    /// sometimes carries over from its security layer.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix("ROLE_").unwrap_or(trimmed);
        match bare.to_ascii_uppercase().as_str() {
            ROLE_USER => Ok(Role::User),
            ROLE_MODERATOR => Ok(Role::Moderator),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{raw}'. Must be one of: {:?}",
                VALID_ROLES
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
