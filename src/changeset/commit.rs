//! Commit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{RemoteCommit, RemoteSignature};

/// Length of an abbreviated commit hash.
const SHORT_SHA_LEN: usize = 7;

/// A commit as recorded in a draft or pull request detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Author name.
    pub author_name: Option<String>,
    /// Author email.
    pub author_email: Option<String>,
    /// Author timestamp.
    pub author_date: Option<DateTime<Utc>>,
    /// Committer name.
    pub committer_name: Option<String>,
    /// Committer email.
    pub committer_email: Option<String>,
    /// Committer timestamp.
    pub committer_date: Option<DateTime<Utc>>,
    /// API URL.
    pub url: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
}

impl CommitRecord {
    /// First line of the message, trimmed.
    #[must_use]
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    /// Message after the first line, trimmed. Empty for one-line messages.
    #[must_use]
    pub fn body(&self) -> &str {
        self.message
            .split_once('\n')
            .map_or("", |(_title, rest)| rest.trim())
    }

    /// Abbreviated hash; hashes shorter than seven characters are returned
    /// unchanged.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.sha
            .char_indices()
            .nth(SHORT_SHA_LEN)
            .and_then(|(end, _)| self.sha.get(..end))
            .unwrap_or(&self.sha)
    }
}

/// Parses an RFC 3339 timestamp; malformed values read as absent.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn split_signature(
    signature: Option<RemoteSignature>,
) -> (Option<String>, Option<String>, Option<DateTime<Utc>>) {
    signature.map_or((None, None, None), |value| {
        let date = parse_timestamp(value.date.as_deref());
        (value.name, value.email, date)
    })
}

impl From<RemoteCommit> for CommitRecord {
    fn from(commit: RemoteCommit) -> Self {
        let (author_name, author_email, author_date) = split_signature(commit.author);
        let (committer_name, committer_email, committer_date) = split_signature(commit.committer);
        Self {
            sha: commit.sha,
            message: commit.message,
            author_name,
            author_email,
            author_date,
            committer_name,
            committer_email,
            committer_date,
            url: commit.url,
            html_url: commit.html_url,
        }
    }
}
