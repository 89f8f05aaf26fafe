use bugboard_client::views::{BugBoard, BugReport, BugThread, ProfileView};
use bugboard_core::bug::{BugStatus, BugUpdate};
use bugboard_core::listing::BugFilter;
use bugboard_core::types::DbId;

use super::{Context, Friendly};
use crate::output;

pub async fn list(ctx: &Context, filter: &BugFilter) -> anyhow::Result<()> {
    let board = BugBoard::new(ctx.api.clone(), ctx.bus.clone());
    board.refresh().await.friendly("Failed to load bugs")?;
    let bugs = board.visible(filter);
    if ctx.json {
        return output::json(&bugs);
    }
    if bugs.is_empty() {
        if filter.is_empty() {
            println!("No bugs reported yet");
        } else {
            println!("No bugs match the filter");
        }
    }
    for bug in &bugs {
        output::print_bug_line(bug);
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: DbId) -> anyhow::Result<()> {
    let thread = BugThread::open(ctx.api.clone(), ctx.bus.clone(), id)
        .await
        .friendly("Failed to load bug")?;
    let snapshot = thread
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("Bug #{id} is not available"))?;
    if ctx.json {
        return output::json(&serde_json::json!({
            "bug": snapshot.bug,
            "comments": snapshot.comments,
        }));
    }
    output::print_thread(&snapshot, thread.bug_actions());
    Ok(())
}

pub async fn profile(ctx: &Context, user_id: Option<String>) -> anyhow::Result<()> {
    let view = match user_id {
        Some(id) => ProfileView::new(ctx.api.clone(), ctx.bus.clone(), id),
        None => ProfileView::for_current_user(ctx.api.clone(), ctx.bus.clone())
            .friendly("Failed to load profile")?,
    };
    let snapshot = view.refresh().await.friendly("Failed to load profile")?;
    if ctx.json {
        return output::json(&serde_json::json!({
            "user": snapshot.user,
            "bugs": snapshot.bugs,
        }));
    }
    output::print_user(&snapshot.user);
    println!();
    for bug in &snapshot.bugs {
        output::print_bug_line(bug);
    }
    Ok(())
}

pub async fn report(
    ctx: &Context,
    title: String,
    description: String,
    image: Option<String>,
    tag_ids: Vec<DbId>,
) -> anyhow::Result<()> {
    let board = BugBoard::new(ctx.api.clone(), ctx.bus.clone());
    let report = BugReport {
        title,
        description,
        image,
        tag_ids,
    };
    let bug = board.report(report).await.friendly("Failed to report bug")?;
    if ctx.json {
        return output::json(&bug);
    }
    println!("Reported bug #{}", bug.id);
    Ok(())
}

pub async fn edit(
    ctx: &Context,
    id: DbId,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    status: Option<BugStatus>,
) -> anyhow::Result<()> {
    let thread = BugThread::open(ctx.api.clone(), ctx.bus.clone(), id)
        .await
        .friendly("Failed to load bug")?;
    let current = thread
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("Bug #{id} is not available"))?;

    let mut update = BugUpdate::from_bug(&current.bug);
    if let Some(title) = title {
        update.title = title;
    }
    if let Some(description) = description {
        update.description = description;
    }
    if image.is_some() {
        update.image = bugboard_core::bug::normalize_image(image);
    }
    if let Some(status) = status {
        update.status = status;
    }
    thread.edit_bug(update).await.friendly("Failed to update bug")?;

    if let Some(snapshot) = thread.snapshot() {
        println!("Updated bug #{id} ({})", snapshot.bug.status);
    }
    Ok(())
}

pub async fn delete(ctx: &Context, id: DbId) -> anyhow::Result<()> {
    let board = BugBoard::new(ctx.api.clone(), ctx.bus.clone());
    board.delete(id).await.friendly("Failed to delete bug")?;
    println!("Deleted bug #{id}");
    Ok(())
}
