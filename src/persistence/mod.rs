//! Local persistence and database migrations.
//!
//! prsync keeps repositories, users, pull requests and their child records in
//! a local `SQLite` database. The schema is managed with Diesel migrations so
//! the database can be created and upgraded consistently across machines.
//! Callers depend on the [`PullRequestStore`] port; [`SqliteStore`] is the
//! shipped implementation.

pub(crate) mod connection;
mod error;
mod migrator;
mod models;
mod sqlite_store;
mod store;

pub use error::PersistenceError;
pub use migrator::{INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database};
pub use models::{
    DEFAULT_USER_GRADE, DEFAULT_USER_TYPE, DescriptionEntry, NewPullRequest, NewUser,
    PriorityEntry, PromotedPullRequest, PullRequestChildren, PullRequestFields, PullRequestId,
    PullRequestRecord, RepositoryRecord, UserRecord,
};
pub use sqlite_store::SqliteStore;
pub use store::PullRequestStore;

#[cfg(test)]
pub use store::MockPullRequestStore;
