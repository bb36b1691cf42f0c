//! Gateway for the GitHub endpoints prsync consumes.
//!
//! The trait-based design enables mocking in tests while the Octocrab
//! implementation handles real HTTP requests. Every method is read-only except
//! [`SourceControlGateway::create_pull_request`].

mod client;
mod error_mapping;
mod octocrab_impl;


pub use octocrab_impl::OctocrabGateway;

use async_trait::async_trait;

use crate::github::error::GatewayError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{
    Comparison, NewRemotePullRequest, RemoteCommit, RemoteFile, RemotePullRequest, RemoteUser,
};

/// Remote source-control operations used by reconciliation and preparation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceControlGateway: Send + Sync {
    /// Compare `base...head` and return counts, commits and file patches.
    async fn compare(
        &self,
        repository: &RepositoryLocator,
        base: &str,
        head: &str,
    ) -> Result<Comparison, GatewayError>;

    /// List every open pull request of the repository, across all pages.
    async fn list_open_pull_requests(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<RemotePullRequest>, GatewayError>;

    /// List the commits of a pull request.
    async fn list_pull_request_commits(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<RemoteCommit>, GatewayError>;

    /// List the changed files of a pull request.
    async fn list_pull_request_files(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<RemoteFile>, GatewayError>;

    /// Create a pull request.
    async fn create_pull_request(
        &self,
        repository: &RepositoryLocator,
        request: &NewRemotePullRequest,
    ) -> Result<RemotePullRequest, GatewayError>;

    /// Identify the account the token belongs to.
    async fn authenticated_user(&self) -> Result<RemoteUser, GatewayError>;
}
