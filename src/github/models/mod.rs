//! Data models for the GitHub resources consumed by prsync.
//!
//! Types prefixed with `Api` are internal deserialisation targets that convert
//! into the public domain types. Only the fields the reconciliation and
//! preparation flows read are modelled.

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// A GitHub account as referenced by pull requests and reviewers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteUser {
    /// Globally unique GitHub account id.
    pub id: u64,
    /// Login name.
    pub login: String,
    /// Public email, when GitHub exposes it.
    pub email: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Account type (`User`, `Bot`, `Organization`).
    pub user_type: Option<String>,
}

/// A pull request as listed or created on GitHub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePullRequest {
    /// Globally unique GitHub id, stable across renumbering.
    pub github_id: u64,
    /// Repository-scoped pull request number.
    pub number: u64,
    /// Title.
    pub title: Option<String>,
    /// Body text.
    pub body: Option<String>,
    /// State (`open`, `closed`).
    pub state: String,
    /// Base branch name.
    pub base: String,
    /// Head branch name.
    pub head: String,
    /// Web URL.
    pub html_url: Option<String>,
    /// Author account, absent for deleted ("ghost") users.
    pub author: Option<RemoteUser>,
    /// Reviewers whose review has been requested.
    pub requested_reviewers: Vec<RemoteUser>,
}

/// Name, email and timestamp attached to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSignature {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// ISO 8601 timestamp.
    pub date: Option<String>,
}

/// A commit returned by the compare and pull request commit endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCommit {
    /// Full commit SHA.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Author signature.
    pub author: Option<RemoteSignature>,
    /// Committer signature.
    pub committer: Option<RemoteSignature>,
    /// API URL.
    pub url: Option<String>,
    /// Web URL.
    pub html_url: Option<String>,
}

/// A changed file with its raw patch text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFile {
    /// Path of the file after the change.
    pub filename: String,
    /// Change status as reported by GitHub (`added`, `removed`, ...).
    pub status: String,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// Total changed lines.
    pub changes: u64,
    /// Unified diff hunks for the file; absent for binary or oversized files.
    pub patch: Option<String>,
    /// Previous path for renamed files.
    pub previous_filename: Option<String>,
    /// Raw content URL.
    pub raw_url: Option<String>,
    /// Blob URL.
    pub blob_url: Option<String>,
}

/// Relationship between the head and base refs of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComparisonStatus {
    /// Head has commits the base lacks.
    Ahead,
    /// Head is missing commits the base has.
    Behind,
    /// Both sides have unique commits.
    Diverged,
    /// Both refs point at the same tree.
    Identical,
    /// A status string this crate does not know.
    Unrecognised(String),
}

impl ComparisonStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ahead => "ahead",
            Self::Behind => "behind",
            Self::Diverged => "diverged",
            Self::Identical => "identical",
            Self::Unrecognised(value) => value.as_str(),
        }
    }
}

impl From<String> for ComparisonStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "ahead" => Self::Ahead,
            "behind" => Self::Behind,
            "diverged" => Self::Diverged,
            "identical" => Self::Identical,
            _ => Self::Unrecognised(value),
        }
    }
}

impl From<ComparisonStatus> for String {
    fn from(value: ComparisonStatus) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of comparing two refs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Comparison status.
    pub status: ComparisonStatus,
    /// Commits on head not on base.
    pub ahead_by: u64,
    /// Commits on base not on head.
    pub behind_by: u64,
    /// Total commits in the comparison.
    pub total_commits: u64,
    /// Tip of the base ref.
    pub base_commit: Option<RemoteCommit>,
    /// Common ancestor of both refs.
    pub merge_base_commit: Option<RemoteCommit>,
    /// Commits in chronological order.
    pub commits: Vec<RemoteCommit>,
    /// Changed files.
    pub files: Vec<RemoteFile>,
    /// Comparison URLs.
    pub links: ComparisonLinks,
}

/// URLs GitHub returns alongside a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonLinks {
    /// API URL.
    pub url: Option<String>,
    /// Web URL.
    pub html_url: Option<String>,
    /// Permalink URL.
    pub permalink_url: Option<String>,
    /// Diff download URL.
    pub diff_url: Option<String>,
    /// Patch download URL.
    pub patch_url: Option<String>,
}

/// Fields sent when creating a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRemotePullRequest {
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Head (source) branch.
    pub head: String,
    /// Base (target) branch.
    pub base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) id: u64,
    pub(crate) login: String,
    pub(crate) email: Option<String>,
    pub(crate) avatar_url: Option<String>,
    #[serde(rename = "type")]
    pub(crate) user_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRef {
    #[serde(rename = "ref")]
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequest {
    pub(crate) id: u64,
    pub(crate) number: u64,
    pub(crate) title: Option<String>,
    pub(crate) body: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) html_url: Option<String>,
    pub(crate) user: Option<ApiUser>,
    pub(crate) base: ApiRef,
    pub(crate) head: ApiRef,
    #[serde(default)]
    pub(crate) requested_reviewers: Vec<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommitDetail {
    pub(crate) message: Option<String>,
    pub(crate) author: Option<RemoteSignature>,
    pub(crate) committer: Option<RemoteSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommit {
    pub(crate) sha: String,
    pub(crate) commit: ApiCommitDetail,
    pub(crate) url: Option<String>,
    pub(crate) html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFile {
    pub(crate) filename: String,
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) additions: u64,
    #[serde(default)]
    pub(crate) deletions: u64,
    #[serde(default)]
    pub(crate) changes: u64,
    pub(crate) patch: Option<String>,
    pub(crate) previous_filename: Option<String>,
    pub(crate) raw_url: Option<String>,
    pub(crate) blob_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiComparison {
    pub(crate) status: ComparisonStatus,
    #[serde(default)]
    pub(crate) ahead_by: u64,
    #[serde(default)]
    pub(crate) behind_by: u64,
    #[serde(default)]
    pub(crate) total_commits: u64,
    pub(crate) base_commit: Option<ApiCommit>,
    pub(crate) merge_base_commit: Option<ApiCommit>,
    #[serde(default)]
    pub(crate) commits: Vec<ApiCommit>,
    #[serde(default)]
    pub(crate) files: Vec<ApiFile>,
    #[serde(flatten)]
    pub(crate) links: ComparisonLinks,
}

impl From<ApiUser> for RemoteUser {
    fn from(value: ApiUser) -> Self {
        Self {
            id: value.id,
            login: value.login,
            email: value.email,
            avatar_url: value.avatar_url,
            user_type: value.user_type,
        }
    }
}

impl From<ApiPullRequest> for RemotePullRequest {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            github_id: value.id,
            number: value.number,
            title: value.title,
            body: value.body,
            state: value.state.unwrap_or_else(|| "open".to_owned()),
            base: value.base.name,
            head: value.head.name,
            html_url: value.html_url,
            author: value.user.map(RemoteUser::from),
            requested_reviewers: value
                .requested_reviewers
                .into_iter()
                .map(RemoteUser::from)
                .collect(),
        }
    }
}

impl From<ApiCommit> for RemoteCommit {
    fn from(value: ApiCommit) -> Self {
        Self {
            sha: value.sha,
            message: value.commit.message.unwrap_or_default(),
            author: value.commit.author,
            committer: value.commit.committer,
            url: value.url,
            html_url: value.html_url,
        }
    }
}

impl From<ApiFile> for RemoteFile {
    fn from(value: ApiFile) -> Self {
        Self {
            filename: value.filename,
            status: value.status,
            additions: value.additions,
            deletions: value.deletions,
            changes: value.changes,
            patch: value.patch,
            previous_filename: value.previous_filename,
            raw_url: value.raw_url,
            blob_url: value.blob_url,
        }
    }
}

impl From<ApiComparison> for Comparison {
    fn from(value: ApiComparison) -> Self {
        Self {
            status: value.status,
            ahead_by: value.ahead_by,
            behind_by: value.behind_by,
            total_commits: value.total_commits,
            base_commit: value.base_commit.map(RemoteCommit::from),
            merge_base_commit: value.merge_base_commit.map(RemoteCommit::from),
            commits: value.commits.into_iter().map(RemoteCommit::from).collect(),
            files: value.files.into_iter().map(RemoteFile::from).collect(),
            links: value.links,
        }
    }
}
