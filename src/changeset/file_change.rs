//! File changes with parsed hunks.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::diff::{DiffHunk, parse_hunks};
use crate::github::RemoteFile;

/// How a file changed between two refs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Deleted file.
    Removed,
    /// Content changed in place.
    Modified,
    /// Moved, possibly with edits.
    Renamed,
    /// Copied from another path.
    Copied,
    /// Mode or type changed.
    Changed,
    /// Listed without changes.
    Unchanged,
    /// Any other status string, preserved verbatim.
    Unknown(String),
}

impl FileStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Unknown(value) => value.as_str(),
        }
    }
}

impl From<String> for FileStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "added" => Self::Added,
            "removed" => Self::Removed,
            "modified" => Self::Modified,
            "renamed" => Self::Renamed,
            "copied" => Self::Copied,
            "changed" => Self::Changed,
            "unchanged" => Self::Unchanged,
            _ => Self::Unknown(value),
        }
    }
}

impl From<FileStatus> for String {
    fn from(value: FileStatus) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One changed file.
///
/// `changes == additions + deletions` holds for every value produced by
/// [`FileChange::from_remote_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path after the change.
    pub filename: String,
    /// Change classification.
    pub status: FileStatus,
    /// Added line count.
    pub additions: u64,
    /// Removed line count.
    pub deletions: u64,
    /// Total changed line count.
    pub changes: u64,
    /// Raw unified diff text, when GitHub supplied one.
    pub patch: Option<String>,
    /// Parsed hunks; absent when the patch is missing, empty, or malformed.
    pub hunks: Option<Vec<DiffHunk>>,
    /// Path before a rename or copy.
    pub previous_filename: Option<String>,
    /// Raw content URL.
    pub raw_url: Option<String>,
    /// Blob URL.
    pub blob_url: Option<String>,
}

impl FileChange {
    /// Converts remote files, isolating per-file failures.
    ///
    /// A file whose counts are inconsistent is dropped with a warning. A file
    /// whose patch fails to parse is kept with its raw patch and no hunks.
    #[must_use]
    pub fn from_remote_files(files: Vec<RemoteFile>) -> Vec<Self> {
        files.into_iter().filter_map(Self::from_remote).collect()
    }

    fn from_remote(file: RemoteFile) -> Option<Self> {
        if file.additions.checked_add(file.deletions) != Some(file.changes) {
            warn!(
                filename = %file.filename,
                additions = file.additions,
                deletions = file.deletions,
                changes = file.changes,
                "dropping file with inconsistent change counts"
            );
            return None;
        }

        let hunks = file
            .patch
            .as_deref()
            .filter(|patch| !patch.trim().is_empty())
            .and_then(|patch| match parse_hunks(patch) {
                Ok(hunks) => Some(hunks),
                Err(error) => {
                    warn!(filename = %file.filename, %error, "failed to parse file patch");
                    None
                }
            });

        Some(Self {
            filename: file.filename,
            status: FileStatus::from(file.status),
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
            patch: file.patch,
            hunks,
            previous_filename: file.previous_filename,
            raw_url: file.raw_url,
            blob_url: file.blob_url,
        })
    }
}
