//! In-process client event bus.
//!
//! Views publish what they re-fetched and any non-blocking notices; front
//! ends subscribe to redraw or to tell the user something went wrong.

pub mod bus;

pub use bus::{ClientEvent, EventBus, Notice, NoticeLevel};
