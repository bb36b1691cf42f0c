//! Pure planning step of reconciliation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::github::RemotePullRequest;
use crate::persistence::{PullRequestFields, PullRequestId, PullRequestRecord};

/// Attribute matching remote entries to local records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileKey {
    /// Repository-scoped pull request number.
    #[default]
    PullRequestNumber,
    /// Globally unique GitHub id; the number is tracked as an attribute.
    GlobalId,
}

impl ReconcileKey {
    /// Key value of a stored record.
    #[must_use]
    pub const fn of_local(self, fields: &PullRequestFields) -> u64 {
        match self {
            Self::PullRequestNumber => fields.github_pr_number,
            Self::GlobalId => fields.github_id,
        }
    }

    /// Key value of a remote entry.
    #[must_use]
    pub const fn of_remote(self, remote: &RemotePullRequest) -> u64 {
        match self {
            Self::PullRequestNumber => remote.number,
            Self::GlobalId => remote.github_id,
        }
    }

    /// The identifier tracked as an attribute under this key.
    ///
    /// Both identifiers are unique in the store, so an unmatched remote entry
    /// whose secondary value belongs to an unlisted record is that record.
    #[must_use]
    pub const fn secondary(self) -> Self {
        match self {
            Self::PullRequestNumber => Self::GlobalId,
            Self::GlobalId => Self::PullRequestNumber,
        }
    }
}

impl FromStr for ReconcileKey {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pull_request_number" | "number" => Ok(Self::PullRequestNumber),
            "global_id" | "id" => Ok(Self::GlobalId),
            _ => Err(ServiceError::validation(format!(
                "unsupported reconcile key '{s}': valid options are 'number' or 'global-id'"
            ))),
        }
    }
}

impl fmt::Display for ReconcileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullRequestNumber => write!(f, "number"),
            Self::GlobalId => write!(f, "global-id"),
        }
    }
}

/// Staged effect of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Remote entries with no local counterpart, in remote order.
    pub creates: Vec<RemotePullRequest>,
    /// Local records rewritten with remote values: key matches in remote
    /// order, then re-keyed records.
    pub updates: Vec<PullRequestRecord>,
    /// Local records the remote no longer lists, in local order.
    pub deletes: Vec<PullRequestId>,
    /// Remote entries whose local record already matches.
    pub unchanged: usize,
}

impl ReconciliationPlan {
    /// Whether applying the plan would write nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Whether any tracked field of `local` differs from `remote`.
///
/// Tracked fields are title, body, state, both branches, and whichever of
/// number or GitHub id is not the match key.
#[must_use]
pub fn has_changed_from(
    local: &PullRequestFields,
    remote: &RemotePullRequest,
    key: ReconcileKey,
) -> bool {
    let other_identifier_changed = match key {
        ReconcileKey::PullRequestNumber => local.github_id != remote.github_id,
        ReconcileKey::GlobalId => local.github_pr_number != remote.number,
    };
    other_identifier_changed
        || local.title != remote_title(remote)
        || local.body != remote.body
        || local.state != remote.state
        || local.base_branch != remote.base
        || local.head_branch != remote.head
}

/// Computes creates, updates, and deletes for one repository.
///
/// Duplicate remote keys are staged once; later duplicates are ignored. A
/// remote entry with no match on the key but whose secondary identifier
/// belongs to a record the remote no longer lists under its key updates that
/// record instead of creating a new one, so renumbering keeps local identity
/// and never stages an insert that collides with a pending delete.
#[must_use]
pub fn plan_reconciliation(
    local: &[PullRequestRecord],
    remote: &[RemotePullRequest],
    key: ReconcileKey,
) -> ReconciliationPlan {
    let by_key: HashMap<u64, &PullRequestRecord> = local
        .iter()
        .map(|record| (key.of_local(&record.fields), record))
        .collect();

    let mut plan = ReconciliationPlan::default();
    let mut seen = HashSet::with_capacity(remote.len());
    let mut unmatched = Vec::new();
    for entry in remote {
        let remote_key = key.of_remote(entry);
        if !seen.insert(remote_key) {
            warn!(key = remote_key, "duplicate remote pull request ignored");
            continue;
        }
        match by_key.get(&remote_key) {
            None => unmatched.push(entry),
            Some(record) if has_changed_from(&record.fields, entry, key) => {
                plan.updates.push(apply_remote(record, entry));
            }
            Some(_) => plan.unchanged += 1,
        }
    }

    let secondary = key.secondary();
    let mut orphans: HashMap<u64, &PullRequestRecord> = local
        .iter()
        .filter(|record| !seen.contains(&key.of_local(&record.fields)))
        .map(|record| (secondary.of_local(&record.fields), record))
        .collect();
    let mut adopted = HashSet::new();
    for entry in unmatched {
        match orphans.remove(&secondary.of_remote(entry)) {
            Some(record) => {
                debug!(
                    id = %record.id,
                    from = key.of_local(&record.fields),
                    to = key.of_remote(entry),
                    %key,
                    "remote pull request re-keyed; keeping local record"
                );
                adopted.insert(record.id);
                plan.updates.push(apply_remote(record, entry));
            }
            None => plan.creates.push(entry.clone()),
        }
    }

    plan.deletes = local
        .iter()
        .filter(|record| {
            !seen.contains(&key.of_local(&record.fields)) && !adopted.contains(&record.id)
        })
        .map(|record| record.id)
        .collect();
    plan
}

pub(super) fn remote_title(remote: &RemotePullRequest) -> String {
    remote.title.clone().unwrap_or_default()
}

fn apply_remote(record: &PullRequestRecord, remote: &RemotePullRequest) -> PullRequestRecord {
    PullRequestRecord {
        id: record.id,
        fields: PullRequestFields {
            github_id: remote.github_id,
            github_pr_number: remote.number,
            title: remote_title(remote),
            body: remote.body.clone(),
            state: remote.state.clone(),
            base_branch: remote.base.clone(),
            head_branch: remote.head.clone(),
            html_url: remote
                .html_url
                .clone()
                .or_else(|| record.fields.html_url.clone()),
            ..record.fields.clone()
        },
    }
}
