//! External-facing pull request capabilities.
//!
//! [`PullRequestService`] is the surface a controller or CLI drives: list and
//! inspect local records, create pull requests, and sync a repository with
//! GitHub. [`LocalPullRequestService`] implements it over the gateway and
//! store ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::changeset::{CommitRecord, FileChange};
use crate::error::ServiceError;
use crate::github::SourceControlGateway;
use crate::persistence::{
    PullRequestChildren, PullRequestId, PullRequestRecord, PullRequestStore, UserRecord,
};
use crate::preparation::{PreparationWorkflow, PromoteRequest};
use crate::reconcile::Reconciler;
use crate::resolve::RepositoryResolver;


/// A stored pull request with its children and live remote detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestDetail {
    /// Stored record.
    pub record: PullRequestRecord,
    /// Reviewers, priorities, and descriptions.
    pub children: PullRequestChildren,
    /// Commits as GitHub lists them now.
    pub commits: Vec<CommitRecord>,
    /// Changed files with parsed hunks.
    pub files: Vec<FileChange>,
}

/// Pull request operations exposed to callers.
#[async_trait]
pub trait PullRequestService: Send + Sync {
    /// Local records of a repository.
    async fn list(&self, repository_id: i64) -> Result<Vec<PullRequestRecord>, ServiceError>;

    /// Local records authored by a user.
    async fn list_authored(&self, author_id: i64) -> Result<Vec<PullRequestRecord>, ServiceError>;

    /// One record with children, commits, and files.
    async fn get(
        &self,
        repository_id: i64,
        id: PullRequestId,
    ) -> Result<PullRequestDetail, ServiceError>;

    /// Creates a pull request on GitHub and records it.
    async fn create(
        &self,
        repository_id: i64,
        request: PromoteRequest,
    ) -> Result<PullRequestRecord, ServiceError>;

    /// Reconciles with the open GitHub listing and returns the local list.
    async fn sync(
        &self,
        repository_id: i64,
        actor: &UserRecord,
    ) -> Result<Vec<PullRequestRecord>, ServiceError>;
}

/// [`PullRequestService`] backed by the local store.
pub struct LocalPullRequestService {
    gateway: Arc<dyn SourceControlGateway>,
    store: Arc<dyn PullRequestStore>,
    resolver: RepositoryResolver,
    workflow: Arc<PreparationWorkflow>,
    reconciler: Reconciler,
}

impl LocalPullRequestService {
    /// Wires the service to its collaborators.
    #[must_use]
    pub const fn new(
        gateway: Arc<dyn SourceControlGateway>,
        store: Arc<dyn PullRequestStore>,
        resolver: RepositoryResolver,
        workflow: Arc<PreparationWorkflow>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            gateway,
            store,
            resolver,
            workflow,
            reconciler,
        }
    }
}

#[async_trait]
impl PullRequestService for LocalPullRequestService {
    async fn list(&self, repository_id: i64) -> Result<Vec<PullRequestRecord>, ServiceError> {
        Ok(self.store.list_by_repository(repository_id)?)
    }

    async fn list_authored(&self, author_id: i64) -> Result<Vec<PullRequestRecord>, ServiceError> {
        Ok(self.store.list_by_author(author_id)?)
    }

    async fn get(
        &self,
        repository_id: i64,
        id: PullRequestId,
    ) -> Result<PullRequestDetail, ServiceError> {
        let record = self
            .store
            .find_by_id(id)?
            .filter(|record| record.fields.repository_id == repository_id)
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "pull request {id} not found in repository {repository_id}"
                ))
            })?;
        let (_, locator) = self.resolver.locate(self.store.as_ref(), repository_id)?;
        let number = record.fields.github_pr_number;

        let (commits, files) = tokio::try_join!(
            self.gateway.list_pull_request_commits(&locator, number),
            self.gateway.list_pull_request_files(&locator, number),
        )?;
        let children = self.store.load_children(id)?;
        debug!(
            %id,
            number,
            commits = commits.len(),
            files = files.len(),
            "loaded pull request detail"
        );

        Ok(PullRequestDetail {
            record,
            children,
            commits: commits.into_iter().map(CommitRecord::from).collect(),
            files: FileChange::from_remote_files(files),
        })
    }

    async fn create(
        &self,
        repository_id: i64,
        request: PromoteRequest,
    ) -> Result<PullRequestRecord, ServiceError> {
        self.workflow.promote(repository_id, request).await
    }

    async fn sync(
        &self,
        repository_id: i64,
        actor: &UserRecord,
    ) -> Result<Vec<PullRequestRecord>, ServiceError> {
        let (_, locator) = self.resolver.locate(self.store.as_ref(), repository_id)?;
        let remote = self.gateway.list_open_pull_requests(&locator).await?;
        self.reconciler.reconcile(repository_id, &remote, actor)?;
        Ok(self.store.list_by_repository(repository_id)?)
    }
}
