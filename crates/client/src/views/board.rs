//! The bug listing.

use std::sync::{Arc, PoisonError, RwLock};

use bugboard_core::bug::{normalize_image, Bug, BugUpdate, NewBug};
use bugboard_core::listing::{sort_most_recent_first, BugFilter};
use bugboard_core::policy::BugActions;
use bugboard_core::types::DbId;
use bugboard_events::{ClientEvent, EventBus};

use crate::api::BugBoardApi;
use crate::error::{ApiError, ApiResult};
use crate::guard::InFlight;

/// Fields of the "report a bug" form.
#[derive(Debug, Clone, Default)]
pub struct BugReport {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub tag_ids: Vec<DbId>,
}

/// All bugs, most recent first.
pub struct BugBoard {
    api: Arc<BugBoardApi>,
    bus: Arc<EventBus>,
    bugs: RwLock<Vec<Bug>>,
    busy: InFlight<&'static str>,
}

impl BugBoard {
    pub fn new(api: Arc<BugBoardApi>, bus: Arc<EventBus>) -> Self {
        Self {
            api,
            bus,
            bugs: RwLock::new(Vec::new()),
            busy: InFlight::new(),
        }
    }

    /// Re-read the listing from the server.
    pub async fn refresh(&self) -> ApiResult<Vec<Bug>> {
        let mut bugs = self.api.list_bugs().await?;
        sort_most_recent_first(&mut bugs);
        tracing::debug!(count = bugs.len(), "Bug listing refetched");
        *self.bugs.write().unwrap_or_else(PoisonError::into_inner) = bugs.clone();
        self.bus.publish(ClientEvent::BugsRefetched { count: bugs.len() });
        Ok(bugs)
    }

    /// The last fetched listing.
    pub fn bugs(&self) -> Vec<Bug> {
        self.bugs.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The last fetched listing narrowed by `filter`.
    pub fn visible(&self, filter: &BugFilter) -> Vec<Bug> {
        let viewer = self.api.current_user();
        filter.apply(self.bugs(), viewer.as_ref())
    }

    /// What the signed-in user may do with `bug` from the listing.
    pub fn actions(&self, bug: &Bug) -> BugActions {
        let viewer = self.api.current_user();
        BugActions::evaluate(viewer.as_ref(), bug, false)
    }

    /// Drop a bug from the snapshot without a round trip, e.g. when another
    /// view reports it deleted.
    pub fn forget(&self, bug_id: DbId) {
        self.bugs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|b| b.id != bug_id);
    }

    /// Report a new bug as the signed-in user, then refetch the listing.
    pub async fn report(&self, report: BugReport) -> ApiResult<Bug> {
        let user = super::signed_in(&self.api, "report a bug")?;
        let bug = NewBug {
            author_id: user.id.clone(),
            title: report.title.trim().to_string(),
            description: report.description.trim().to_string(),
            image: normalize_image(report.image),
            tag_ids: report.tag_ids,
        };
        bug.validate()?;

        let _guard = self.busy.try_begin("report").ok_or(ApiError::Busy("report"))?;
        let created = self.api.report_bug(&bug).await?;
        tracing::info!(bug_id = created.id, user_id = %user.id, "Bug reported");
        self.refresh().await?;
        Ok(created)
    }

    /// Edit a bug from the listing, then refetch.
    pub async fn edit(&self, bug_id: DbId, update: BugUpdate) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "edit a bug")?;
        let bug = self.lookup(bug_id).await?;
        let _guard = self.busy.try_begin("edit").ok_or(ApiError::Busy("edit"))?;
        super::save_bug(&self.api, &user, &bug, &update).await?;
        self.refresh().await?;
        Ok(())
    }

    /// Delete a bug from the listing, then refetch.
    pub async fn delete(&self, bug_id: DbId) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "delete a bug")?;
        let bug = self.lookup(bug_id).await?;
        let _guard = self.busy.try_begin("delete").ok_or(ApiError::Busy("delete"))?;
        super::remove_bug(&self.api, &self.bus, &user, &bug).await?;
        self.forget(bug_id);
        self.refresh().await?;
        Ok(())
    }

    async fn lookup(&self, bug_id: DbId) -> ApiResult<Bug> {
        let cached = self
            .bugs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|b| b.id == bug_id)
            .cloned();
        match cached {
            Some(bug) => Ok(bug),
            None => self.api.get_bug(bug_id).await,
        }
    }
}
