//! Commits and file changes derived from remote comparisons.
//!
//! These are the local, serialisable shapes stored inside preparation drafts
//! and returned by pull request detail queries.

mod commit;
mod file_change;

pub use commit::CommitRecord;
pub use file_change::{FileChange, FileStatus};
