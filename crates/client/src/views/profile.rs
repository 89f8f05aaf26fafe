//! A user's profile page: the account and the bugs they reported.

use std::sync::{Arc, PoisonError, RwLock};

use bugboard_core::bug::{Bug, BugUpdate};
use bugboard_core::error::CoreError;
use bugboard_core::listing::sort_most_recent_first;
use bugboard_core::types::{DbId, UserId};
use bugboard_core::user::User;
use bugboard_events::{ClientEvent, EventBus};

use crate::api::BugBoardApi;
use crate::error::{ApiError, ApiResult};
use crate::guard::InFlight;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    pub user: User,
    /// Most recent first.
    pub bugs: Vec<Bug>,
}

pub struct ProfileView {
    api: Arc<BugBoardApi>,
    bus: Arc<EventBus>,
    user_id: UserId,
    snapshot: RwLock<Option<ProfileSnapshot>>,
    busy: InFlight<DbId>,
}

impl ProfileView {
    pub fn new(api: Arc<BugBoardApi>, bus: Arc<EventBus>, user_id: impl Into<UserId>) -> Self {
        Self {
            api,
            bus,
            user_id: user_id.into(),
            snapshot: RwLock::new(None),
            busy: InFlight::new(),
        }
    }

    /// The profile of the signed-in user.
    pub fn for_current_user(api: Arc<BugBoardApi>, bus: Arc<EventBus>) -> ApiResult<Self> {
        let user = super::signed_in(&api, "view your profile")?;
        Ok(Self::new(api, bus, user.id))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn snapshot(&self) -> Option<ProfileSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the user and their bugs.
    ///
    /// When this is the signed-in user's own profile, the stored session is
    /// updated with the fresh account data (score, role).
    pub async fn refresh(&self) -> ApiResult<ProfileSnapshot> {
        let (user, mut bugs) = tokio::try_join!(
            self.api.get_user(&self.user_id),
            self.api.list_user_bugs(&self.user_id)
        )?;
        sort_most_recent_first(&mut bugs);
        self.api.session().refresh_user(user.clone())?;
        let snapshot = ProfileSnapshot { user, bugs };
        self.bus.publish(ClientEvent::BugsRefetched {
            count: snapshot.bugs.len(),
        });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn edit_bug(&self, bug_id: DbId, update: BugUpdate) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "edit a bug")?;
        let bug = self.find(bug_id).await?;
        let _guard = self.busy.try_begin(bug_id).ok_or(ApiError::Busy("edit bug"))?;
        super::save_bug(&self.api, &user, &bug, &update).await?;
        self.refresh().await?;
        Ok(())
    }

    /// Delete one of the listed bugs, then refetch the profile.
    pub async fn delete_bug(&self, bug_id: DbId) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "delete a bug")?;
        let bug = self.find(bug_id).await?;
        let _guard = self.busy.try_begin(bug_id).ok_or(ApiError::Busy("delete bug"))?;
        super::remove_bug(&self.api, &self.bus, &user, &bug).await?;
        self.refresh().await?;
        Ok(())
    }

    async fn find(&self, bug_id: DbId) -> ApiResult<Bug> {
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot,
            None => self.refresh().await?,
        };
        snapshot
            .bugs
            .into_iter()
            .find(|b| b.id == bug_id)
            .ok_or_else(|| CoreError::not_found("bug", bug_id).into())
    }
}
