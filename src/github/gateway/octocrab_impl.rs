//! Octocrab implementation of the source-control gateway.

use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;

use crate::github::error::GatewayError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{
    ApiCommit, ApiComparison, ApiFile, ApiPullRequest, ApiUser, Comparison, NewRemotePullRequest,
    RemoteCommit, RemoteFile, RemotePullRequest, RemoteUser,
};

use super::SourceControlGateway;
use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

/// Page size requested from list endpoints (GitHub's maximum).
const PER_PAGE: &str = "100";

/// Octocrab-backed gateway.
pub struct OctocrabGateway {
    client: Octocrab,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when the base URI cannot be parsed or
    /// `GatewayError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, GatewayError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }

    async fn fetch_all<T>(
        &self,
        operation: &str,
        route: String,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned + Send,
    {
        let first_page: Page<T> = self
            .client
            .get(route, Some(query))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        self.client
            .all_pages(first_page)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))
    }
}

#[async_trait]
impl SourceControlGateway for OctocrabGateway {
    async fn compare(
        &self,
        repository: &RepositoryLocator,
        base: &str,
        head: &str,
    ) -> Result<Comparison, GatewayError> {
        self.client
            .get::<ApiComparison, _, _>(repository.compare_path(base, head), None::<&()>)
            .await
            .map(Comparison::from)
            .map_err(|error| map_octocrab_error("compare", &error))
    }

    async fn list_open_pull_requests(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<RemotePullRequest>, GatewayError> {
        let pulls: Vec<ApiPullRequest> = self
            .fetch_all(
                "list pulls",
                repository.pulls_path(),
                &[("state", "open"), ("per_page", PER_PAGE)],
            )
            .await?;
        Ok(pulls.into_iter().map(RemotePullRequest::from).collect())
    }

    async fn list_pull_request_commits(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<RemoteCommit>, GatewayError> {
        let commits: Vec<ApiCommit> = self
            .fetch_all(
                "pull request commits",
                repository.pull_request_commits_path(number),
                &[("per_page", PER_PAGE)],
            )
            .await?;
        Ok(commits.into_iter().map(RemoteCommit::from).collect())
    }

    async fn list_pull_request_files(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<Vec<RemoteFile>, GatewayError> {
        let files: Vec<ApiFile> = self
            .fetch_all(
                "pull request files",
                repository.pull_request_files_path(number),
                &[("per_page", PER_PAGE)],
            )
            .await?;
        Ok(files.into_iter().map(RemoteFile::from).collect())
    }

    async fn create_pull_request(
        &self,
        repository: &RepositoryLocator,
        request: &NewRemotePullRequest,
    ) -> Result<RemotePullRequest, GatewayError> {
        let created: ApiPullRequest = self
            .client
            .post(repository.pulls_path(), Some(request))
            .await
            .map_err(|error| map_octocrab_error("create pull request", &error))?;
        Ok(created.into())
    }

    async fn authenticated_user(&self) -> Result<RemoteUser, GatewayError> {
        self.client
            .get::<ApiUser, _, _>("/user", None::<&()>)
            .await
            .map(RemoteUser::from)
            .map_err(|error| map_octocrab_error("authenticated user", &error))
    }
}
