//! Stateful views over the API client.
//!
//! Each view owns the last snapshot it fetched and re-reads it from the
//! server after every mutation; nothing is updated optimistically.

pub mod account;
pub mod board;
pub mod moderation;
pub mod profile;
pub mod thread;

use bugboard_core::bug::{Bug, BugUpdate};
use bugboard_core::moderation::edits_as_moderator;
use bugboard_core::policy;
use bugboard_core::user::{acting_user, User};
use bugboard_events::{ClientEvent, EventBus};

use crate::api::BugBoardApi;
use crate::error::ApiResult;

pub use account::{AccountView, Registration};
pub use board::{BugBoard, BugReport};
pub use moderation::ModerationDesk;
pub use profile::{ProfileSnapshot, ProfileView};
pub use thread::{BugThread, ThreadSnapshot, VoteOutcome};

/// The signed-in user, or an unauthorized error naming `action`.
pub(crate) fn signed_in(api: &BugBoardApi, action: &str) -> ApiResult<User> {
    let session = api.session().current();
    let user = policy::require_user(acting_user(session.as_ref()), action)?;
    Ok(user.clone())
}

/// Save an edit of `bug`, routing moderator edits of other users' bugs
/// through the moderation endpoint.
pub(crate) async fn save_bug(
    api: &BugBoardApi,
    user: &User,
    bug: &Bug,
    update: &BugUpdate,
) -> ApiResult<()> {
    policy::require(policy::can_edit_bug(Some(user), bug), "edit this bug")?;
    update.validate()?;
    if edits_as_moderator(user, bug) {
        tracing::info!(bug_id = bug.id, moderator_id = %user.id, status = %update.status, "Moderator editing bug");
        api.moderate_bug(bug.id, &user.id, update).await
    } else {
        tracing::info!(bug_id = bug.id, user_id = %user.id, status = %update.status, "Editing bug");
        api.update_bug(bug.id, &user.id, update).await
    }
}

/// Delete `bug` and tell every other view to drop it.
pub(crate) async fn remove_bug(
    api: &BugBoardApi,
    bus: &EventBus,
    user: &User,
    bug: &Bug,
) -> ApiResult<()> {
    policy::require(policy::can_delete_bug(Some(user), bug), "delete this bug")?;
    api.delete_bug(bug.id, &user.id).await?;
    tracing::info!(bug_id = bug.id, user_id = %user.id, "Bug deleted");
    bus.publish(ClientEvent::BugRemoved { bug_id: bug.id });
    Ok(())
}
