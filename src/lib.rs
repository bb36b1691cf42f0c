//! prsync library crate: keeps a local pull request store in step with GitHub.
//!
//! The library reconciles the open GitHub listing of a repository with local
//! records, parses unified diffs into addressable hunks, and composes draft
//! pull requests in a TTL-bounded cache before creating them on GitHub.
//! GitHub access goes through Octocrab behind the
//! [`github::SourceControlGateway`] port; local state lives in `SQLite` behind
//! the [`persistence::PullRequestStore`] port.

pub mod changeset;
pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod persistence;
pub mod preparation;
pub mod reconcile;
pub mod resolve;
pub mod service;
pub mod telemetry;

pub use config::{OperationMode, PrsyncConfig};
pub use error::ServiceError;
pub use github::{GatewayError, OctocrabGateway, PersonalAccessToken, RepositoryLocator};
pub use preparation::PreparationWorkflow;
pub use reconcile::{ReconcileKey, Reconciler};
pub use service::{LocalPullRequestService, PullRequestService};
