//! The current session, held in memory and optionally persisted to disk.
//!
//! Plays the role the browser's local storage played: the bearer token and
//! user survive between runs until logout or account deletion.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use bugboard_core::user::{Session, User};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Holder of the current [`Session`], shared by the API client and views.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// An in-memory store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store backed by `path`, loading any session saved there.
    ///
    /// A missing file means "logged out". A corrupt file is an error so the
    /// caller can decide whether to discard it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(raw) => Some(serde_json::from_str::<Session>(&raw).map_err(|source| {
                SessionError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        if let Some(session) = &current {
            tracing::debug!(user_id = %session.user.id, path = %path.display(), "Restored session");
        }
        Ok(Self {
            current: RwLock::new(current),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.current().map(|s| s.user)
    }

    pub fn token(&self) -> Option<String> {
        self.current()
            .map(|s| s.token)
            .filter(|t| !t.is_empty())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the current session and persist it.
    pub fn set(&self, session: Session) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(&session).map_err(|source| {
                SessionError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            std::fs::write(path, raw).map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Update the stored user (e.g. after a profile refetch), keeping the token.
    pub fn refresh_user(&self, user: User) -> Result<(), SessionError> {
        match self.current() {
            Some(session) if session.user.id == user.id => self.set(Session { user, ..session }),
            _ => Ok(()),
        }
    }

    /// Drop the session from memory and disk.
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(SessionError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}
