//! Persistence port used by reconciliation, preparation, and the service.

use super::PersistenceError;
use super::models::{
    NewPullRequest, NewUser, PromotedPullRequest, PullRequestChildren, PullRequestId,
    PullRequestRecord, RepositoryRecord, UserRecord,
};

/// Local pull request store.
///
/// Bulk writes are atomic: either every staged row lands or none does.
#[cfg_attr(test, mockall::automock)]
pub trait PullRequestStore: Send + Sync {
    /// Records belonging to a repository, ordered by pull request number.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn list_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<PullRequestRecord>, PersistenceError>;

    /// Records authored by a user, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn list_by_author(&self, author_id: i64) -> Result<Vec<PullRequestRecord>, PersistenceError>;

    /// Looks up a record by local id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn find_by_id(&self, id: PullRequestId)
    -> Result<Option<PullRequestRecord>, PersistenceError>;

    /// Looks up the record for an exact `(base, head)` branch pair.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn find_by_branches(
        &self,
        repository_id: i64,
        base: &str,
        head: &str,
    ) -> Result<Option<PullRequestRecord>, PersistenceError>;

    /// Reviewers, priorities, and descriptions linked to a record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn load_children(&self, id: PullRequestId) -> Result<PullRequestChildren, PersistenceError>;

    /// Looks up a repository by local id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn find_repository(
        &self,
        repository_id: i64,
    ) -> Result<Option<RepositoryRecord>, PersistenceError>;

    /// Returns the repository with this `owner/name`, inserting it if new.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query or insert fails.
    fn find_or_create_repository(
        &self,
        full_name: &str,
    ) -> Result<RepositoryRecord, PersistenceError>;

    /// Looks up a user by local id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, PersistenceError>;

    /// Returns the user with this GitHub id, registering a minimal record
    /// (zero reward points, `BASIC` grade) if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query or insert fails.
    fn find_or_register_user(&self, user: &NewUser) -> Result<UserRecord, PersistenceError>;

    /// Inserts `creates` (with their reviewer links) and rewrites `updates`
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when any write fails.
    fn save_all(
        &self,
        creates: &[NewPullRequest],
        updates: &[PullRequestRecord],
    ) -> Result<(), PersistenceError>;

    /// Hard-deletes records; child rows cascade. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the delete fails.
    fn delete_all(&self, ids: &[PullRequestId]) -> Result<usize, PersistenceError>;

    /// Inserts a promoted pull request with all of its children in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when any write fails.
    fn save_promoted(
        &self,
        promoted: &PromotedPullRequest,
    ) -> Result<PullRequestRecord, PersistenceError>;
}
