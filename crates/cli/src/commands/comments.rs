use bugboard_client::views::{BugThread, VoteOutcome};
use bugboard_core::types::DbId;
use bugboard_core::vote::{VoteDirection, VoteTarget};
use clap::Subcommand;

use super::{Context, Friendly};
use crate::output;

#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// Post an answer
    Add {
        bug_id: DbId,
        text: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Edit one of your answers
    Edit {
        bug_id: DbId,
        comment_id: DbId,
        text: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete an answer
    Delete { bug_id: DbId, comment_id: DbId },
}

async fn open(ctx: &Context, bug_id: DbId) -> anyhow::Result<BugThread> {
    BugThread::open(ctx.api.clone(), ctx.bus.clone(), bug_id)
        .await
        .friendly("Failed to load bug")
}

pub async fn run(ctx: &Context, command: CommentCommand) -> anyhow::Result<()> {
    match command {
        CommentCommand::Add {
            bug_id,
            text,
            image,
        } => {
            let thread = open(ctx, bug_id).await?;
            let comment = thread
                .add_comment(&text, image)
                .await
                .friendly("Failed to create comment")?;
            if ctx.json {
                return output::json(&comment);
            }
            println!("Posted answer #{} on bug #{bug_id}", comment.id);
        }
        CommentCommand::Edit {
            bug_id,
            comment_id,
            text,
            image,
        } => {
            let thread = open(ctx, bug_id).await?;
            thread
                .edit_comment(comment_id, &text, image)
                .await
                .friendly("Failed to update comment")?;
            println!("Updated answer #{comment_id}");
        }
        CommentCommand::Delete { bug_id, comment_id } => {
            let thread = open(ctx, bug_id).await?;
            thread
                .delete_comment(comment_id)
                .await
                .friendly("Failed to delete comment")?;
            println!("Deleted answer #{comment_id}");
        }
    }
    Ok(())
}

pub async fn vote(
    ctx: &Context,
    bug_id: DbId,
    comment: Option<DbId>,
    direction: VoteDirection,
) -> anyhow::Result<()> {
    let thread = open(ctx, bug_id).await?;
    let target = match comment {
        Some(id) => VoteTarget::Comment(id),
        None => VoteTarget::Bug(bug_id),
    };
    match thread.vote(target, direction).await.friendly("Failed to vote")? {
        VoteOutcome::Counted { vote_count } => {
            println!("Voted {direction} on {} #{}: {vote_count} votes", target.kind(), target.id())
        }
        VoteOutcome::Ignored => println!("A vote is already in progress"),
    }
    Ok(())
}

pub async fn accept(ctx: &Context, bug_id: DbId, comment_id: DbId) -> anyhow::Result<()> {
    let thread = open(ctx, bug_id).await?;
    thread
        .accept(comment_id)
        .await
        .friendly("Failed to accept comment")?;
    println!("Accepted answer #{comment_id} on bug #{bug_id}");
    Ok(())
}
