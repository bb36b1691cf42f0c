//! Reconciliation of the local pull request store with GitHub.
//!
//! A pass loads every local record of a repository, plans the minimal set of
//! creates, updates, and deletes against the remote open listing, resolves
//! authors and reviewers, then applies the plan: creates and updates in one
//! bulk write, deletes in a second. Local ids survive remote edits.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::github::{RemotePullRequest, RemoteUser};
use crate::persistence::{
    NewPullRequest, NewUser, PullRequestFields, PullRequestStore, UserRecord,
};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

mod plan;

pub use plan::{ReconcileKey, ReconciliationPlan, has_changed_from, plan_reconciliation};

#[cfg(test)]
mod tests;

/// Counts of what a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Records inserted.
    pub created: usize,
    /// Records rewritten.
    pub updated: usize,
    /// Records removed.
    pub deleted: usize,
    /// Records left as they were.
    pub unchanged: usize,
}

/// Applies reconciliation plans through a [`PullRequestStore`].
///
/// At most one pass per repository should be in flight; callers enforce it.
pub struct Reconciler {
    store: Arc<dyn PullRequestStore>,
    telemetry: Arc<dyn TelemetrySink>,
    key: ReconcileKey,
}

impl Reconciler {
    /// Creates a reconciler matching on pull request numbers.
    #[must_use]
    pub fn new(store: Arc<dyn PullRequestStore>) -> Self {
        Self {
            store,
            telemetry: Arc::new(NoopTelemetrySink),
            key: ReconcileKey::default(),
        }
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Changes the match key.
    #[must_use]
    pub fn with_key(mut self, key: ReconcileKey) -> Self {
        self.key = key;
        self
    }

    /// Brings the local records of `repository_id` in line with `remote`.
    ///
    /// Remote entries without an author are attributed to `actor`. Unknown
    /// GitHub accounts are registered before anything is written, so a
    /// registration failure leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PersistenceFailure`] when loading, user
    /// registration, or either bulk write fails.
    pub fn reconcile(
        &self,
        repository_id: i64,
        remote: &[RemotePullRequest],
        actor: &UserRecord,
    ) -> Result<ReconcileSummary, ServiceError> {
        let local = self.store.list_by_repository(repository_id)?;
        let plan = plan_reconciliation(&local, remote, self.key);
        debug!(
            repository_id,
            local = local.len(),
            remote = remote.len(),
            creates = plan.creates.len(),
            updates = plan.updates.len(),
            deletes = plan.deletes.len(),
            "planned reconciliation"
        );

        let mut users = UserResolver::new(self.store.as_ref(), actor);
        let creates = plan
            .creates
            .iter()
            .map(|entry| users.stage(repository_id, entry))
            .collect::<Result<Vec<_>, _>>()?;

        if !creates.is_empty() || !plan.updates.is_empty() {
            self.store.save_all(&creates, &plan.updates)?;
        }
        let deleted = if plan.deletes.is_empty() {
            0
        } else {
            self.store.delete_all(&plan.deletes)?
        };

        let summary = ReconcileSummary {
            created: creates.len(),
            updated: plan.updates.len(),
            deleted,
            unchanged: plan.unchanged,
        };
        self.telemetry.record(TelemetryEvent::PullRequestsReconciled {
            repository_id,
            created: summary.created,
            updated: summary.updated,
            deleted: summary.deleted,
        });
        info!(
            repository_id,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            unchanged = summary.unchanged,
            "reconciled pull requests"
        );
        Ok(summary)
    }
}

/// Maps GitHub accounts to local user ids for one pass.
struct UserResolver<'a> {
    store: &'a dyn PullRequestStore,
    actor_id: i64,
    known: HashMap<u64, i64>,
}

impl<'a> UserResolver<'a> {
    fn new(store: &'a dyn PullRequestStore, actor: &UserRecord) -> Self {
        Self {
            store,
            actor_id: actor.id,
            known: HashMap::from([(actor.github_id, actor.id)]),
        }
    }

    fn resolve(&mut self, user: &RemoteUser) -> Result<i64, ServiceError> {
        if let Some(id) = self.known.get(&user.id) {
            return Ok(*id);
        }
        let record = self.store.find_or_register_user(&NewUser::from(user))?;
        self.known.insert(user.id, record.id);
        Ok(record.id)
    }

    fn stage(
        &mut self,
        repository_id: i64,
        entry: &RemotePullRequest,
    ) -> Result<NewPullRequest, ServiceError> {
        let author_id = match &entry.author {
            Some(author) => self.resolve(author)?,
            None => self.actor_id,
        };
        let mut reviewer_ids = Vec::with_capacity(entry.requested_reviewers.len());
        for reviewer in &entry.requested_reviewers {
            let id = self.resolve(reviewer)?;
            if !reviewer_ids.contains(&id) {
                reviewer_ids.push(id);
            }
        }

        Ok(NewPullRequest {
            fields: PullRequestFields {
                repository_id,
                author_id,
                github_id: entry.github_id,
                github_pr_number: entry.number,
                title: plan::remote_title(entry),
                body: entry.body.clone(),
                state: entry.state.clone(),
                base_branch: entry.base.clone(),
                head_branch: entry.head.clone(),
                summary: None,
                html_url: entry.html_url.clone(),
            },
            reviewer_ids,
        })
    }
}
