//! BugBoard REST client library.
//!
//! Provides the HTTP API wrapper, configuration, the persisted session, a
//! per-control in-flight guard, and the stateful views (listing, bug thread,
//! profile, account, moderation) that sit on top of them.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod views;

pub use api::BugBoardApi;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use session::SessionStore;
