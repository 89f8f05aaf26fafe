//! Moderator tools that are not tied to a single bug: bans.

use std::sync::Arc;

use bugboard_core::moderation::{can_ban, BanRequest};
use bugboard_core::policy;
use bugboard_events::{EventBus, Notice};

use crate::api::BugBoardApi;
use crate::error::ApiResult;

pub struct ModerationDesk {
    api: Arc<BugBoardApi>,
    bus: Arc<EventBus>,
}

impl ModerationDesk {
    pub fn new(api: Arc<BugBoardApi>, bus: Arc<EventBus>) -> Self {
        Self { api, bus }
    }

    /// Ban `user_id` with a free-text reason. Takes effect immediately.
    pub async fn ban(&self, user_id: &str, reason: &str) -> ApiResult<()> {
        let moderator = super::signed_in(&self.api, "ban users")?;
        policy::require(can_ban(Some(&moderator), user_id), "ban this user")?;
        let request = BanRequest::new(reason)?;
        self.api.ban_user(user_id, &moderator.id, &request).await?;
        tracing::info!(user_id, moderator_id = %moderator.id, reason = %request.reason, "User banned");
        self.bus
            .notify(Notice::info("ban", format!("User {user_id} has been banned")));
        Ok(())
    }

    pub async fn unban(&self, user_id: &str) -> ApiResult<()> {
        let moderator = super::signed_in(&self.api, "unban users")?;
        policy::require(can_ban(Some(&moderator), user_id), "unban this user")?;
        self.api.unban_user(user_id, &moderator.id).await?;
        tracing::info!(user_id, moderator_id = %moderator.id, "User unbanned");
        self.bus
            .notify(Notice::info("unban", format!("User {user_id} has been unbanned")));
        Ok(())
    }
}
