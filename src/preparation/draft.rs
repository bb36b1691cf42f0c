//! Draft pull requests held in the preparation cache.

use serde::{Deserialize, Serialize};

use crate::changeset::{CommitRecord, FileChange};
use crate::github::{Comparison, ComparisonLinks, ComparisonStatus};
use crate::persistence::{DescriptionEntry, PriorityEntry, RepositoryRecord, UserRecord};

/// Identity of a draft: repository plus source/target branch pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftKey {
    repository_id: i64,
    source: String,
    target: String,
}

impl DraftKey {
    /// Creates a key. Branch names are stored verbatim and sanitised only when
    /// deriving the cache key string.
    #[must_use]
    pub fn new(repository_id: i64, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            repository_id,
            source: source.into(),
            target: target.into(),
        }
    }

    /// Local repository id.
    #[must_use]
    pub const fn repository_id(&self) -> i64 {
        self.repository_id
    }

    /// Head branch the pull request would merge from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Base branch the pull request would merge into.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Comparison metadata captured when the draft was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Ref relationship.
    pub status: ComparisonStatus,
    /// Commits on source not on target.
    pub ahead_by: u64,
    /// Commits on target not on source.
    pub behind_by: u64,
    /// Total commits in the comparison.
    pub total_commits: u64,
    /// Tip of the target branch.
    pub base_commit: Option<CommitRecord>,
    /// Common ancestor.
    pub merge_base_commit: Option<CommitRecord>,
    /// Commits in comparison order.
    pub commits: Vec<CommitRecord>,
    /// Changed files with parsed hunks.
    pub files: Vec<FileChange>,
    /// Comparison URLs.
    pub links: ComparisonLinks,
}

impl From<Comparison> for ComparisonSummary {
    fn from(comparison: Comparison) -> Self {
        Self {
            status: comparison.status,
            ahead_by: comparison.ahead_by,
            behind_by: comparison.behind_by,
            total_commits: comparison.total_commits,
            base_commit: comparison.base_commit.map(CommitRecord::from),
            merge_base_commit: comparison.merge_base_commit.map(CommitRecord::from),
            commits: comparison
                .commits
                .into_iter()
                .map(CommitRecord::from)
                .collect(),
            files: FileChange::from_remote_files(comparison.files),
            links: comparison.links,
        }
    }
}

/// User reference embedded in a draft (author or reviewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Local user id.
    pub id: i64,
    /// GitHub account id.
    pub github_id: u64,
    /// GitHub login.
    pub login: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

impl From<&UserRecord> for UserInfo {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            github_id: user.github_id,
            login: user.github_username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A pull request being composed before it exists on GitHub.
///
/// The key and comparison are fixed at creation; enrichment fields change
/// only through the `set_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationDraft {
    key: DraftKey,
    repository: RepositoryRecord,
    author: UserInfo,
    comparison: ComparisonSummary,
    is_creatable: bool,
    title: Option<String>,
    body: Option<String>,
    reviewers: Vec<UserInfo>,
    priorities: Vec<PriorityEntry>,
    descriptions: Vec<DescriptionEntry>,
    summary: Option<String>,
}

impl PreparationDraft {
    /// Creates a draft with no enrichment.
    #[must_use]
    pub const fn new(
        key: DraftKey,
        repository: RepositoryRecord,
        author: UserInfo,
        comparison: ComparisonSummary,
        is_creatable: bool,
    ) -> Self {
        Self {
            key,
            repository,
            author,
            comparison,
            is_creatable,
            title: None,
            body: None,
            reviewers: Vec::new(),
            priorities: Vec::new(),
            descriptions: Vec::new(),
            summary: None,
        }
    }

    /// Draft identity.
    #[must_use]
    pub const fn key(&self) -> &DraftKey {
        &self.key
    }

    /// Repository the draft targets.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryRecord {
        &self.repository
    }

    /// User who started the draft.
    #[must_use]
    pub const fn author(&self) -> &UserInfo {
        &self.author
    }

    /// Comparison captured at creation.
    #[must_use]
    pub const fn comparison(&self) -> &ComparisonSummary {
        &self.comparison
    }

    /// Whether GitHub would accept a pull request for this branch pair.
    #[must_use]
    pub const fn is_creatable(&self) -> bool {
        self.is_creatable
    }

    /// Title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Body, if set.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Requested reviewers.
    #[must_use]
    pub fn reviewers(&self) -> &[UserInfo] {
        &self.reviewers
    }

    /// Priority notes.
    #[must_use]
    pub fn priorities(&self) -> &[PriorityEntry] {
        &self.priorities
    }

    /// Per-file descriptions.
    #[must_use]
    pub fn descriptions(&self) -> &[DescriptionEntry] {
        &self.descriptions
    }

    /// Summary, if set.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Replaces the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    /// Replaces the reviewer list.
    pub fn set_reviewers(&mut self, reviewers: Vec<UserInfo>) {
        self.reviewers = reviewers;
    }

    /// Replaces the priority list.
    pub fn set_priorities(&mut self, priorities: Vec<PriorityEntry>) {
        self.priorities = priorities;
    }

    /// Replaces the description list.
    pub fn set_descriptions(&mut self, descriptions: Vec<DescriptionEntry>) {
        self.descriptions = descriptions;
    }

    /// Replaces the summary.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }
}
