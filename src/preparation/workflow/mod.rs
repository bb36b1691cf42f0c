//! Draft lifecycle: start from a comparison, enrich, promote.
//!
//! The workflow is the only writer of drafts. Enrichment of one draft key is
//! serialised inside the process; plain writes stay last-writer-wins.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ServiceError;
use crate::github::{ComparisonStatus, NewRemotePullRequest, SourceControlGateway};
use crate::persistence::{
    DescriptionEntry, NewPullRequest, PriorityEntry, PromotedPullRequest, PullRequestFields,
    PullRequestRecord, PullRequestStore, UserRecord,
};
use crate::resolve::RepositoryResolver;
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

use super::cache::{PreparationCache, draft_cache_key};
use super::draft::{ComparisonSummary, DraftKey, PreparationDraft, UserInfo};

mod locks;

use locks::DraftLocks;


/// Partial update applied to an existing draft.
///
/// `None`, empty lists, and a blank summary leave the draft untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichRequest {
    /// Head branch of the draft.
    pub source: String,
    /// Base branch of the draft.
    pub target: String,
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub body: Option<String>,
    /// Local user ids to request review from.
    pub reviewer_ids: Vec<i64>,
    /// Replacement priority notes.
    pub priorities: Vec<PriorityEntry>,
    /// Replacement file descriptions.
    pub descriptions: Vec<DescriptionEntry>,
    /// New summary.
    pub summary: Option<String>,
}

/// Everything needed to create a pull request on GitHub and record it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoteRequest {
    /// Head branch.
    pub source: String,
    /// Base branch.
    pub target: String,
    /// Pull request title.
    pub title: String,
    /// Pull request body.
    pub body: Option<String>,
    /// Summary stored with the local record.
    pub summary: Option<String>,
    /// Local id of the user creating the pull request.
    pub author_id: i64,
    /// Local user ids of reviewers.
    pub reviewer_ids: Vec<i64>,
    /// Priority notes.
    pub priorities: Vec<PriorityEntry>,
    /// File descriptions.
    pub descriptions: Vec<DescriptionEntry>,
}

/// Whether GitHub would accept a pull request for a comparison.
///
/// | status       | creatable when     |
/// |--------------|--------------------|
/// | ahead        | `ahead_by > 0`     |
/// | behind       | `total_commits > 0`|
/// | diverged     | `ahead_by > 0`     |
/// | identical    | never              |
/// | unrecognised | never              |
#[must_use]
pub fn is_creatable(status: &ComparisonStatus, ahead_by: u64, total_commits: u64) -> bool {
    match status {
        ComparisonStatus::Ahead | ComparisonStatus::Diverged => ahead_by > 0,
        ComparisonStatus::Behind => total_commits > 0,
        ComparisonStatus::Identical => false,
        ComparisonStatus::Unrecognised(value) => {
            warn!(status = %value, "unrecognised comparison status; draft is not creatable");
            false
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_branches(source: &str, target: &str) -> Result<(), ServiceError> {
    require(source, "source branch")?;
    require(target, "target branch")?;
    if source == target {
        return Err(ServiceError::validation(
            "source and target branches must differ",
        ));
    }
    Ok(())
}

/// Orchestrates drafts across GitHub, the cache, and the local store.
pub struct PreparationWorkflow {
    gateway: Arc<dyn SourceControlGateway>,
    store: Arc<dyn PullRequestStore>,
    cache: PreparationCache,
    resolver: RepositoryResolver,
    telemetry: Arc<dyn TelemetrySink>,
    locks: DraftLocks,
}

impl PreparationWorkflow {
    /// Creates a workflow that records no telemetry.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SourceControlGateway>,
        store: Arc<dyn PullRequestStore>,
        cache: PreparationCache,
        resolver: RepositoryResolver,
    ) -> Self {
        Self {
            gateway,
            store,
            cache,
            resolver,
            telemetry: Arc::new(NoopTelemetrySink),
            locks: DraftLocks::default(),
        }
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Compares `target...source` on GitHub and caches a fresh draft.
    ///
    /// An existing draft for the same key is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] for blank or equal branches,
    /// [`ServiceError::Conflict`] when a pull request already exists for the
    /// pair, and remote or persistence failures otherwise.
    pub async fn start_preparation(
        &self,
        repository_id: i64,
        source: &str,
        target: &str,
        author: &UserRecord,
    ) -> Result<PreparationDraft, ServiceError> {
        validate_branches(source, target)?;
        self.ensure_no_pull_request(repository_id, source, target)?;
        let (repository, locator) = self.resolver.locate(self.store.as_ref(), repository_id)?;

        let comparison = self.gateway.compare(&locator, target, source).await?;
        let summary = ComparisonSummary::from(comparison);
        let creatable = is_creatable(&summary.status, summary.ahead_by, summary.total_commits);

        let draft = PreparationDraft::new(
            DraftKey::new(repository_id, source, target),
            repository,
            UserInfo::from(author),
            summary,
            creatable,
        );
        self.cache.put(&draft)?;

        info!(
            repository_id,
            source,
            target,
            status = %draft.comparison().status,
            commits = draft.comparison().commits.len(),
            files = draft.comparison().files.len(),
            creatable,
            "started preparation"
        );
        Ok(draft)
    }

    /// Returns the cached draft.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when no live draft exists.
    pub fn draft(
        &self,
        repository_id: i64,
        source: &str,
        target: &str,
    ) -> Result<PreparationDraft, ServiceError> {
        let key = DraftKey::new(repository_id, source, target);
        self.cache.get(&key).ok_or_else(|| missing_draft(&key))
    }

    /// Applies the fields present in `request` to the cached draft.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when no draft exists or a reviewer
    /// id is unknown, and [`ServiceError::PersistenceFailure`] when the draft
    /// cannot be written back.
    pub async fn enrich(
        &self,
        repository_id: i64,
        request: EnrichRequest,
    ) -> Result<PreparationDraft, ServiceError> {
        let key = DraftKey::new(repository_id, request.source, request.target);
        let _guard = self.locks.acquire(&draft_cache_key(&key)).await;

        let mut draft = self.cache.get(&key).ok_or_else(|| {
            ServiceError::not_found(format!("no draft to enrich for {}", describe(&key)))
        })?;

        if let Some(title) = request.title {
            draft.set_title(title);
        }
        if let Some(body) = request.body {
            draft.set_body(body);
        }
        if !request.reviewer_ids.is_empty() {
            let reviewers = self.resolve_users(&request.reviewer_ids)?;
            draft.set_reviewers(reviewers.iter().map(UserInfo::from).collect());
        }
        if !request.priorities.is_empty() {
            draft.set_priorities(request.priorities);
        }
        if !request.descriptions.is_empty() {
            draft.set_descriptions(request.descriptions);
        }
        if let Some(summary) = request.summary.filter(|value| !value.trim().is_empty()) {
            draft.set_summary(summary);
        }

        self.cache.put(&draft)?;
        Ok(draft)
    }

    /// Creates the pull request on GitHub and records it locally.
    ///
    /// The local record, reviewers, priorities, and descriptions are written
    /// in one transaction. Any cached draft is left to expire.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] for missing fields,
    /// [`ServiceError::Conflict`] when a pull request already exists for the
    /// branch pair, [`ServiceError::NotFound`] for unknown users, and remote
    /// or persistence failures otherwise.
    pub async fn promote(
        &self,
        repository_id: i64,
        request: PromoteRequest,
    ) -> Result<PullRequestRecord, ServiceError> {
        validate_branches(&request.source, &request.target)?;
        require(&request.title, "title")?;
        self.ensure_no_pull_request(repository_id, &request.source, &request.target)?;

        let author_id = request.author_id;
        let author = self
            .store
            .find_user(author_id)?
            .ok_or_else(|| ServiceError::not_found(format!("user {author_id} not found")))?;
        let reviewers = self.resolve_users(&request.reviewer_ids)?;
        let (_, locator) = self.resolver.locate(self.store.as_ref(), repository_id)?;

        let created = self
            .gateway
            .create_pull_request(
                &locator,
                &NewRemotePullRequest {
                    title: request.title.clone(),
                    body: request.body.clone(),
                    head: request.source.clone(),
                    base: request.target.clone(),
                },
            )
            .await?;

        let promoted = PromotedPullRequest {
            pull_request: NewPullRequest {
                fields: PullRequestFields {
                    repository_id,
                    author_id: author.id,
                    github_id: created.github_id,
                    github_pr_number: created.number,
                    title: created.title.unwrap_or(request.title),
                    body: created.body.or(request.body),
                    state: created.state,
                    base_branch: request.target,
                    head_branch: request.source,
                    summary: request.summary,
                    html_url: created.html_url,
                },
                reviewer_ids: reviewers.iter().map(|reviewer| reviewer.id).collect(),
            },
            priorities: request.priorities,
            descriptions: request.descriptions,
        };

        let record = self.store.save_promoted(&promoted).map_err(|failure| {
            error!(
                repository_id,
                github_pr_number = created.number,
                error = %failure,
                "pull request created on GitHub but not recorded locally"
            );
            ServiceError::from(failure)
        })?;

        self.telemetry.record(TelemetryEvent::DraftPromoted {
            repository_id,
            github_pr_number: record.fields.github_pr_number,
        });
        info!(
            repository_id,
            github_pr_number = record.fields.github_pr_number,
            "promoted draft"
        );
        Ok(record)
    }

    /// Promotes the cached draft for a branch pair.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] without a draft,
    /// [`ServiceError::ValidationFailed`] when the draft has no title or
    /// nothing to merge, and any error from [`Self::promote`].
    pub async fn promote_draft(
        &self,
        repository_id: i64,
        source: &str,
        target: &str,
    ) -> Result<PullRequestRecord, ServiceError> {
        let draft = self.draft(repository_id, source, target)?;
        if !draft.is_creatable() {
            return Err(ServiceError::validation(format!(
                "{} has no commits to merge",
                describe(draft.key())
            )));
        }
        let title = draft
            .title()
            .ok_or_else(|| ServiceError::validation("draft has no title; enrich it first"))?;

        let request = PromoteRequest {
            source: source.to_owned(),
            target: target.to_owned(),
            title: title.to_owned(),
            body: draft.body().map(str::to_owned),
            summary: draft.summary().map(str::to_owned),
            author_id: draft.author().id,
            reviewer_ids: draft.reviewers().iter().map(|reviewer| reviewer.id).collect(),
            priorities: draft.priorities().to_vec(),
            descriptions: draft.descriptions().to_vec(),
        };
        self.promote(repository_id, request).await
    }

    /// Drops the cached draft for a branch pair, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PersistenceFailure`] when the backend delete
    /// fails.
    pub fn discard(
        &self,
        repository_id: i64,
        source: &str,
        target: &str,
    ) -> Result<(), ServiceError> {
        Ok(self
            .cache
            .delete(&DraftKey::new(repository_id, source, target))?)
    }

    fn ensure_no_pull_request(
        &self,
        repository_id: i64,
        source: &str,
        target: &str,
    ) -> Result<(), ServiceError> {
        match self.store.find_by_branches(repository_id, target, source)? {
            Some(existing) => Err(ServiceError::conflict(format!(
                "pull request #{} already exists for {source} -> {target}",
                existing.fields.github_pr_number
            ))),
            None => Ok(()),
        }
    }

    fn resolve_users(&self, ids: &[i64]) -> Result<Vec<UserRecord>, ServiceError> {
        ids.iter()
            .map(|id| {
                self.store
                    .find_user(*id)?
                    .ok_or_else(|| ServiceError::not_found(format!("user {id} not found")))
            })
            .collect()
    }
}

fn describe(key: &DraftKey) -> String {
    format!(
        "repository {} ({} -> {})",
        key.repository_id(),
        key.source(),
        key.target()
    )
}

fn missing_draft(key: &DraftKey) -> ServiceError {
    ServiceError::not_found(format!("no draft for {}", describe(key)))
}
