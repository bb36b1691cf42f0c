//! Records held in the local store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::github::RemoteUser;

/// Grade assigned to auto-registered users.
pub const DEFAULT_USER_GRADE: &str = "BASIC";

/// Account type recorded when GitHub omits one.
pub const DEFAULT_USER_TYPE: &str = "User";

/// Opaque local identifier of a pull request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PullRequestId(i64);

impl PullRequestId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A repository known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Local row id.
    pub id: i64,
    /// `owner/name`.
    pub full_name: String,
}

/// A user known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Local row id.
    pub id: i64,
    /// GitHub account id.
    pub github_id: u64,
    /// GitHub login.
    pub github_username: String,
    /// Public email, when known.
    pub github_email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// `User`, `Bot`, or `Organization`.
    pub user_type: String,
    /// Accumulated reward points.
    pub reward_points: i64,
    /// Grade label.
    pub user_grade: String,
}

/// Minimal user registered on first sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// GitHub account id.
    pub github_id: u64,
    /// GitHub login.
    pub github_username: String,
    /// Public email, when known.
    pub github_email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Account type.
    pub user_type: String,
}

impl From<&RemoteUser> for NewUser {
    fn from(user: &RemoteUser) -> Self {
        Self {
            github_id: user.id,
            github_username: user.login.clone(),
            github_email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            user_type: user
                .user_type
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_TYPE.to_owned()),
        }
    }
}

/// Fields shared by stored and not-yet-stored pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFields {
    /// Owning repository row id.
    pub repository_id: i64,
    /// Author user row id.
    pub author_id: i64,
    /// Globally unique GitHub id.
    pub github_id: u64,
    /// Number within the repository.
    pub github_pr_number: u64,
    /// Title.
    pub title: String,
    /// Description body.
    pub body: Option<String>,
    /// `open` or `closed`.
    pub state: String,
    /// Target branch.
    pub base_branch: String,
    /// Source branch.
    pub head_branch: String,
    /// Comparison summary written at promotion time.
    pub summary: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
}

/// A stored pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Local identity, stable across remote edits.
    pub id: PullRequestId,
    /// Stored attributes.
    #[serde(flatten)]
    pub fields: PullRequestFields,
}

/// A pull request staged for insertion, with reviewers to link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Attributes to store.
    pub fields: PullRequestFields,
    /// User row ids of requested reviewers.
    pub reviewer_ids: Vec<i64>,
}

/// Ordered priority note attached at promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    /// Display order.
    pub idx: i32,
    /// Short heading.
    pub title: String,
    /// Note text.
    pub content: String,
}

/// Per-file description attached at promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    /// File path the note refers to.
    pub path: String,
    /// Diff position within the file.
    pub position: i32,
    /// Caller-supplied key correlating the note with its source.
    pub record_key: String,
}

/// A freshly created remote pull request plus its child records, saved in
/// one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedPullRequest {
    /// Record and reviewers.
    pub pull_request: NewPullRequest,
    /// Priority notes.
    pub priorities: Vec<PriorityEntry>,
    /// File descriptions.
    pub descriptions: Vec<DescriptionEntry>,
}

/// Child records of a stored pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestChildren {
    /// Linked reviewers.
    pub reviewers: Vec<UserRecord>,
    /// Priority notes ordered by `idx`.
    pub priorities: Vec<PriorityEntry>,
    /// File descriptions in insertion order.
    pub descriptions: Vec<DescriptionEntry>,
}
