//! Client event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ClientEvent`]s and is
//! shared via `Arc<EventBus>` between the API views and the front end.

use bugboard_core::types::{DbId, Timestamp, UserId};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-blocking message for the user, such as a failed vote.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Short action label, e.g. `"vote"`.
    pub action: String,
    pub message: String,
    pub timestamp: Timestamp,
}

impl Notice {
    pub fn new(level: NoticeLevel, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            action: action.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, action, message)
    }

    pub fn info(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, action, message)
    }
}

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The bug listing was re-read from the server.
    BugsRefetched { count: usize },
    /// A bug and its comments were re-read from the server.
    ThreadRefetched { bug_id: DbId, comment_count: usize },
    /// A bug was deleted; every view showing it should drop it.
    BugRemoved { bug_id: DbId },
    /// The session was established or cleared.
    SessionChanged { user_id: Option<UserId> },
    Notice(Notice),
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use bugboard_events::{ClientEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ClientEvent::BugRemoved { bug_id: 1 });
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: ClientEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Publish a notice, logging it as well so it is never lost when
    /// nobody is subscribed.
    pub fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::warn!(action = %notice.action, message = %notice.message, "Action failed")
            }
            NoticeLevel::Warning | NoticeLevel::Info => {
                tracing::info!(action = %notice.action, message = %notice.message, "Notice")
            }
        }
        self.publish(ClientEvent::Notice(notice));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
