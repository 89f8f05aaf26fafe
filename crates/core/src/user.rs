//! User accounts and the authenticated session.
//!
//! The session is passed explicitly into every policy check; nothing in
//! this crate reads ambient identity state.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::types::{null_as_default, string_or_number, UserId};

/// A user account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: UserId,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    /// Server-computed reputation. Displayed, never computed here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banned: bool,
}

impl User {
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// The denormalized author reference embedded in bugs and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

/// An authenticated session: the bearer token and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Borrow the acting user out of an optional session.
///
/// Every policy function takes `Option<&User>`; an absent session maps to
/// `None` and therefore to "no permission".
pub fn acting_user(session: Option<&Session>) -> Option<&User> {
    session.map(Session::user)
}
