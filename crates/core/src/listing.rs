//! Filtering and ordering of bug listings.

use crate::bug::{Bug, BugStatus};
use crate::types::DbId;
use crate::user::User;

/// Criteria for narrowing a bug listing. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of the author's username.
    pub author: Option<String>,
    /// Only bugs authored by the viewer.
    pub only_mine: bool,
    pub tag_id: Option<DbId>,
    pub status: Option<BugStatus>,
}

impl BugFilter {
    pub fn is_empty(&self) -> bool {
        *self == BugFilter::default()
    }

    pub fn matches(&self, bug: &Bug, viewer: Option<&User>) -> bool {
        if let Some(needle) = non_blank(&self.title) {
            if !contains_ignore_case(&bug.title, needle) {
                return false;
            }
        }
        if let Some(needle) = non_blank(&self.author) {
            if !contains_ignore_case(&bug.author.username, needle) {
                return false;
            }
        }
        if self.only_mine && !viewer.is_some_and(|u| bug.is_authored_by(&u.id)) {
            return false;
        }
        if let Some(tag_id) = self.tag_id {
            if !bug.has_tag(tag_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if bug.status != status {
                return false;
            }
        }
        true
    }

    /// Filter `bugs` and order the survivors most-recent-first.
    pub fn apply(&self, bugs: Vec<Bug>, viewer: Option<&User>) -> Vec<Bug> {
        let mut out: Vec<Bug> = bugs.into_iter().filter(|b| self.matches(b, viewer)).collect();
        sort_most_recent_first(&mut out);
        out
    }
}

/// Newest bugs first; ties broken by descending id.
pub fn sort_most_recent_first(bugs: &mut [Bug]) {
    bugs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
