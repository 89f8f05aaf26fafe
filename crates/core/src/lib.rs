//! Domain rules for the BugBoard client.
//!
//! Pure types and decision functions with no I/O: the data model the
//! backend serves, the status gate, and the authorization and moderation
//! policies evaluated against an explicit session.

pub mod account;
pub mod bug;
pub mod comment;
pub mod error;
pub mod listing;
pub mod moderation;
pub mod policy;
pub mod roles;
pub mod types;
pub mod user;
pub mod vote;
