use std::sync::Arc;

use bugboard_client::{ApiResult, BugBoardApi};
use bugboard_core::bug::BugStatus;
use bugboard_core::types::DbId;
use bugboard_core::vote::VoteDirection;
use bugboard_events::EventBus;
use clap::Subcommand;

pub mod account;
pub mod bugs;
pub mod comments;
pub mod moderation;
pub mod tags;

/// Shared handles for one invocation.
pub struct Context {
    pub api: Arc<BugBoardApi>,
    pub bus: Arc<EventBus>,
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        username: String,
        #[arg(long, env = "BUGBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "BUGBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Change your password
    Passwd {
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Delete your account
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List bugs, most recent first
    Bugs {
        /// Case-insensitive title substring
        #[arg(long)]
        title: Option<String>,
        /// Case-insensitive author name substring
        #[arg(long)]
        author: Option<String>,
        /// Only bugs you reported
        #[arg(long)]
        mine: bool,
        #[arg(long)]
        tag: Option<DbId>,
        #[arg(long, value_parser = parse_status)]
        status: Option<BugStatus>,
    },
    /// Show a bug with its answers
    Show { id: DbId },
    /// Show a user's profile and bugs (default: yours)
    Profile { user_id: Option<String> },
    /// Report a new bug
    Report {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        image: Option<String>,
        /// Tag id, repeatable
        #[arg(long = "tag")]
        tags: Vec<DbId>,
    },
    /// Edit a bug (author or moderator)
    Edit {
        id: DbId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Image URL; pass `--image ""` to remove the current one
        #[arg(long)]
        image: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<BugStatus>,
    },
    /// Delete a bug (author or moderator)
    Delete { id: DbId },
    /// Work with answers on a bug
    Comment {
        #[command(subcommand)]
        action: comments::CommentCommand,
    },
    /// Vote on a bug, or on one of its answers with --comment
    Vote {
        bug_id: DbId,
        #[arg(long)]
        comment: Option<DbId>,
        /// `up`/`upvote` or `down`/`downvote`
        #[arg(long, default_value = "up", value_parser = parse_direction)]
        direction: VoteDirection,
    },
    /// Accept an answer on your bug
    Accept { bug_id: DbId, comment_id: DbId },
    /// Ban a user (moderators)
    Ban {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Lift a ban (moderators)
    Unban { user_id: String },
    /// List or create tags
    Tags {
        #[command(subcommand)]
        action: Option<TagCommand>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    List,
    Create { name: String },
}

fn parse_status(raw: &str) -> Result<BugStatus, String> {
    BugStatus::parse(raw).map_err(|e| e.to_string())
}

fn parse_direction(raw: &str) -> Result<VoteDirection, String> {
    VoteDirection::parse(raw).map_err(|e| e.to_string())
}

pub async fn run(ctx: &Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => account::login(ctx, &username, &password).await,
        Command::Logout => account::logout(ctx),
        Command::Register {
            username,
            email,
            password,
            phone,
        } => account::register(ctx, username, email, password, phone).await,
        Command::Whoami => account::whoami(ctx),
        Command::Passwd { new, confirm } => account::change_password(ctx, &new, &confirm).await,
        Command::DeleteAccount { yes } => account::delete_account(ctx, yes).await,
        Command::Bugs {
            title,
            author,
            mine,
            tag,
            status,
        } => {
            let filter = bugboard_core::listing::BugFilter {
                title,
                author,
                only_mine: mine,
                tag_id: tag,
                status,
            };
            bugs::list(ctx, &filter).await
        }
        Command::Show { id } => bugs::show(ctx, id).await,
        Command::Profile { user_id } => bugs::profile(ctx, user_id).await,
        Command::Report {
            title,
            description,
            image,
            tags,
        } => bugs::report(ctx, title, description, image, tags).await,
        Command::Edit {
            id,
            title,
            description,
            image,
            status,
        } => bugs::edit(ctx, id, title, description, image, status).await,
        Command::Delete { id } => bugs::delete(ctx, id).await,
        Command::Comment { action } => comments::run(ctx, action).await,
        Command::Vote {
            bug_id,
            comment,
            direction,
        } => comments::vote(ctx, bug_id, comment, direction).await,
        Command::Accept { bug_id, comment_id } => comments::accept(ctx, bug_id, comment_id).await,
        Command::Ban { user_id, reason } => moderation::ban(ctx, &user_id, &reason).await,
        Command::Unban { user_id } => moderation::unban(ctx, &user_id).await,
        Command::Tags { action } => match action.unwrap_or(TagCommand::List) {
            TagCommand::List => tags::list(ctx).await,
            TagCommand::Create { name } => tags::create(ctx, &name).await,
        },
    }
}

/// Turn a client error into the message shown to the user.
pub trait Friendly<T> {
    fn friendly(self, fallback: &str) -> anyhow::Result<T>;
}

impl<T> Friendly<T> for ApiResult<T> {
    fn friendly(self, fallback: &str) -> anyhow::Result<T> {
        self.map_err(|err| {
            tracing::debug!(error = %err, "Command failed");
            anyhow::anyhow!(err.user_message(fallback))
        })
    }
}
