//! One bug with its comments: votes, answers and the accept decision.

use std::sync::{Arc, PoisonError, RwLock};

use bugboard_core::bug::{ensure_open_for_comments, normalize_image, Bug, BugUpdate};
use bugboard_core::comment::{
    accepted_comment, ensure_single_accepted, sort_most_recent_first, Comment, CommentUpdate, NewComment,
};
use bugboard_core::error::CoreError;
use bugboard_core::policy::{self, BugActions, CommentActions};
use bugboard_core::types::{DbId, UserId};
use bugboard_core::vote::{BugVote, CommentVote, VoteDirection, VoteTarget};
use bugboard_events::{ClientEvent, EventBus, Notice, NoticeLevel};

use crate::api::BugBoardApi;
use crate::error::{ApiError, ApiResult};
use crate::guard::InFlight;

/// The bug and its comments as last fetched. Comments are newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSnapshot {
    pub bug: Bug,
    pub comments: Vec<Comment>,
}

impl ThreadSnapshot {
    pub fn comment(&self, comment_id: DbId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

/// Result of a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was written; `vote_count` is the refetched total.
    Counted { vote_count: i64 },
    /// Another vote by the same user on the same target was still pending.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Control {
    Comment,
    EditComment(DbId),
    DeleteComment(DbId),
    Accept,
    EditBug,
    DeleteBug,
}

impl Control {
    fn label(self) -> &'static str {
        match self {
            Control::Comment => "comment",
            Control::EditComment(_) => "edit comment",
            Control::DeleteComment(_) => "delete comment",
            Control::Accept => "accept",
            Control::EditBug => "edit bug",
            Control::DeleteBug => "delete bug",
        }
    }
}

/// Details page of a single bug.
pub struct BugThread {
    api: Arc<BugBoardApi>,
    bus: Arc<EventBus>,
    bug_id: DbId,
    snapshot: RwLock<Option<ThreadSnapshot>>,
    votes: InFlight<(UserId, VoteTarget)>,
    controls: InFlight<Control>,
}

impl BugThread {
    pub fn new(api: Arc<BugBoardApi>, bus: Arc<EventBus>, bug_id: DbId) -> Self {
        Self {
            api,
            bus,
            bug_id,
            snapshot: RwLock::new(None),
            votes: InFlight::new(),
            controls: InFlight::new(),
        }
    }

    /// Open a thread and fetch it.
    pub async fn open(api: Arc<BugBoardApi>, bus: Arc<EventBus>, bug_id: DbId) -> ApiResult<Self> {
        let thread = Self::new(api, bus, bug_id);
        thread.refresh().await?;
        Ok(thread)
    }

    pub fn bug_id(&self) -> DbId {
        self.bug_id
    }

    /// The last fetched state, if any.
    pub fn snapshot(&self) -> Option<ThreadSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the bug and its comments together.
    ///
    /// More than one accepted comment in the result is reported as a warning
    /// notice; the snapshot is still stored as the server returned it.
    pub async fn refresh(&self) -> ApiResult<ThreadSnapshot> {
        let (bug, mut comments) = tokio::try_join!(
            self.api.get_bug(self.bug_id),
            self.api.list_comments(self.bug_id)
        )?;
        sort_most_recent_first(&mut comments);
        self.check_accepted(&comments);
        let snapshot = ThreadSnapshot { bug, comments };
        self.store(snapshot.clone());
        Ok(snapshot)
    }

    /// What the signed-in user may do with the bug right now.
    pub fn bug_actions(&self) -> Option<BugActions> {
        let snapshot = self.snapshot()?;
        let viewer = self.api.current_user();
        let voting = viewer.as_ref().is_some_and(|u| {
            self.votes
                .is_active(&(u.id.clone(), VoteTarget::Bug(self.bug_id)))
        });
        Some(BugActions::evaluate(viewer.as_ref(), &snapshot.bug, voting))
    }

    /// What the signed-in user may do with one comment right now.
    pub fn comment_actions(&self, comment_id: DbId) -> Option<CommentActions> {
        let snapshot = self.snapshot()?;
        let comment = snapshot.comment(comment_id)?;
        let viewer = self.api.current_user();
        let mut actions = CommentActions::evaluate(viewer.as_ref(), &snapshot.bug, comment);
        if let Some(u) = viewer.as_ref() {
            if self
                .votes
                .is_active(&(u.id.clone(), VoteTarget::Comment(comment_id)))
            {
                actions.vote = false;
            }
        }
        Some(actions)
    }

    pub fn is_voting(&self, user_id: &str, target: VoteTarget) -> bool {
        self.votes.is_active(&(user_id.to_string(), target))
    }

    /// Cast a vote on the bug or one of its comments.
    ///
    /// Exactly one write followed by one refetch of what was voted on. A
    /// second call for the same user and target while the first is pending
    /// returns [`VoteOutcome::Ignored`] without touching the network. A
    /// failed write is published as an error notice and returned.
    pub async fn vote(&self, target: VoteTarget, direction: VoteDirection) -> ApiResult<VoteOutcome> {
        let user = super::signed_in(&self.api, "vote")?;
        let Some(_guard) = self.votes.try_begin((user.id.clone(), target)) else {
            tracing::debug!(user_id = %user.id, target = target.kind(), id = target.id(), "Vote already pending, ignored");
            return Ok(VoteOutcome::Ignored);
        };
        let snapshot = self.loaded().await?;

        let written = match target {
            VoteTarget::Bug(bug_id) => {
                if bug_id != self.bug_id {
                    return Err(CoreError::not_found("bug", bug_id).into());
                }
                policy::require(
                    policy::can_vote_bug(Some(&user), &snapshot.bug, false),
                    "vote on this bug",
                )?;
                let vote = BugVote {
                    user_id: user.id.clone(),
                    vote_type: direction,
                };
                self.api.vote_bug(bug_id, &vote).await
            }
            VoteTarget::Comment(comment_id) => {
                let comment = snapshot
                    .comment(comment_id)
                    .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
                policy::require(
                    policy::can_vote_comment(Some(&user), comment),
                    "vote on this comment",
                )?;
                let vote = CommentVote {
                    user_id: user.id.clone(),
                    comment_id,
                    vote_type: direction,
                };
                self.api.vote_comment(&vote).await
            }
        };
        if let Err(err) = written {
            self.bus
                .notify(Notice::error("vote", err.user_message("Failed to vote")));
            return Err(err);
        }
        tracing::info!(user_id = %user.id, target = target.kind(), id = target.id(), direction = %direction, "Vote recorded");

        let vote_count = match target {
            VoteTarget::Bug(_) => self.refetch_bug().await?.vote_count,
            VoteTarget::Comment(comment_id) => self
                .refetch_comments()
                .await?
                .iter()
                .find(|c| c.id == comment_id)
                .map(|c| c.vote_count)
                .unwrap_or_default(),
        };
        Ok(VoteOutcome::Counted { vote_count })
    }

    /// Post an answer. Refused while the bug is solved.
    pub async fn add_comment(&self, text: &str, image: Option<String>) -> ApiResult<Comment> {
        let user = super::signed_in(&self.api, "comment")?;
        let snapshot = self.loaded().await?;
        ensure_open_for_comments(&snapshot.bug)?;
        policy::require(
            policy::can_submit_comment(Some(&user), &snapshot.bug),
            "comment on this bug",
        )?;
        let comment = NewComment {
            bug_id: self.bug_id,
            author_id: user.id.clone(),
            text: text.trim().to_string(),
            image: normalize_image(image),
        };
        comment.validate()?;

        let _guard = self.begin(Control::Comment)?;
        let created = self.api.create_comment(&comment).await?;
        tracing::info!(bug_id = self.bug_id, comment_id = created.id, user_id = %user.id, "Comment posted");
        self.refetch_comments().await?;
        Ok(created)
    }

    pub async fn edit_comment(&self, comment_id: DbId, text: &str, image: Option<String>) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "edit a comment")?;
        let snapshot = self.loaded().await?;
        let comment = snapshot
            .comment(comment_id)
            .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
        policy::require(policy::can_edit_comment(Some(&user), comment), "edit this comment")?;
        let update = CommentUpdate {
            author_id: user.id.clone(),
            text: text.trim().to_string(),
            image: normalize_image(image),
        };
        update.validate()?;

        let _guard = self.begin(Control::EditComment(comment_id))?;
        self.api.update_comment(comment_id, &update).await?;
        self.refetch_comments().await?;
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: DbId) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "delete a comment")?;
        let snapshot = self.loaded().await?;
        let comment = snapshot
            .comment(comment_id)
            .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
        policy::require(policy::can_delete_comment(Some(&user), comment), "delete this comment")?;

        let _guard = self.begin(Control::DeleteComment(comment_id))?;
        self.api.delete_comment(comment_id, &user.id).await?;
        tracing::info!(bug_id = self.bug_id, comment_id, user_id = %user.id, "Comment deleted");
        self.refetch_comments().await?;
        Ok(())
    }

    /// Mark a comment as the accepted answer, then refetch the whole thread.
    pub async fn accept(&self, comment_id: DbId) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "accept an answer")?;
        let snapshot = self.loaded().await?;
        let comment = snapshot
            .comment(comment_id)
            .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
        policy::require(
            policy::can_accept_comment(Some(&user), &snapshot.bug),
            "accept an answer on this bug",
        )?;
        if comment.accepted {
            return Err(CoreError::Conflict(format!("Comment {comment_id} is already accepted")).into());
        }

        let replaced = accepted_comment(&snapshot.comments).map(|c| c.id);

        let _guard = self.begin(Control::Accept)?;
        self.api.accept_comment(self.bug_id, comment_id, &user.id).await?;
        tracing::info!(bug_id = self.bug_id, comment_id, replaced = ?replaced, user_id = %user.id, "Answer accepted");
        self.refresh().await?;
        Ok(())
    }

    pub async fn edit_bug(&self, update: BugUpdate) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "edit a bug")?;
        let snapshot = self.loaded().await?;
        let _guard = self.begin(Control::EditBug)?;
        super::save_bug(&self.api, &user, &snapshot.bug, &update).await?;
        self.refresh().await?;
        Ok(())
    }

    /// Delete the bug. The snapshot is cleared; the thread is closed.
    pub async fn delete_bug(&self) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "delete a bug")?;
        let snapshot = self.loaded().await?;
        let _guard = self.begin(Control::DeleteBug)?;
        super::remove_bug(&self.api, &self.bus, &user, &snapshot.bug).await?;
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    // ---- internals ----

    fn begin(&self, control: Control) -> ApiResult<crate::guard::InFlightGuard<'_, Control>> {
        self.controls
            .try_begin(control)
            .ok_or(ApiError::Busy(control.label()))
    }

    async fn loaded(&self) -> ApiResult<ThreadSnapshot> {
        match self.snapshot() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh().await,
        }
    }

    async fn refetch_bug(&self) -> ApiResult<Bug> {
        let bug = self.api.get_bug(self.bug_id).await?;
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = slot.as_mut() {
            snapshot.bug = bug.clone();
            self.publish_refetched(snapshot);
        }
        Ok(bug)
    }

    async fn refetch_comments(&self) -> ApiResult<Vec<Comment>> {
        let mut comments = self.api.list_comments(self.bug_id).await?;
        sort_most_recent_first(&mut comments);
        self.check_accepted(&comments);
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = slot.as_mut() {
            snapshot.comments = comments.clone();
            self.publish_refetched(snapshot);
        }
        Ok(comments)
    }

    fn store(&self, snapshot: ThreadSnapshot) {
        self.publish_refetched(&snapshot);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn publish_refetched(&self, snapshot: &ThreadSnapshot) {
        self.bus.publish(ClientEvent::ThreadRefetched {
            bug_id: self.bug_id,
            comment_count: snapshot.comments.len(),
        });
    }

    fn check_accepted(&self, comments: &[Comment]) {
        if let Err(err) = ensure_single_accepted(self.bug_id, comments) {
            self.bus
                .notify(Notice::new(NoticeLevel::Warning, "accept", err.to_string()));
        }
    }
}
