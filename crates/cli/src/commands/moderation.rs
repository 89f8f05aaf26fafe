use bugboard_client::views::ModerationDesk;

use super::{Context, Friendly};

pub async fn ban(ctx: &Context, user_id: &str, reason: &str) -> anyhow::Result<()> {
    ModerationDesk::new(ctx.api.clone(), ctx.bus.clone())
        .ban(user_id, reason)
        .await
        .friendly("Failed to ban user")
}

pub async fn unban(ctx: &Context, user_id: &str) -> anyhow::Result<()> {
    ModerationDesk::new(ctx.api.clone(), ctx.bus.clone())
        .unban(user_id)
        .await
        .friendly("Failed to unban user")
}
