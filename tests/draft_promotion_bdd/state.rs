//! Scenario state and shared utilities for draft promotion BDD tests.

use std::sync::Arc;

use prsync::persistence::PullRequestRecord;
use prsync::preparation::{PreparationCache, PreparationDraft, SqliteCacheBackend};
use prsync::telemetry::test_support::RecordingSink;
use prsync::{PreparationWorkflow, ServiceError};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::support::Harness;
use crate::support::runtime::{SharedRuntime, ensure_runtime_and_harness};

#[derive(ScenarioState, Default)]
pub(crate) struct DraftState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) harness: Slot<Harness>,
    pub(crate) telemetry: Slot<Arc<RecordingSink>>,
    pub(crate) draft: Slot<PreparationDraft>,
    pub(crate) record: Slot<PullRequestRecord>,
    pub(crate) error: Slot<ServiceError>,
}

/// Ensures the runtime, harness, and telemetry sink are initialised.
pub(crate) fn ensure_harness(draft_state: &DraftState) -> SharedRuntime {
    let runtime = ensure_runtime_and_harness(&draft_state.runtime, &draft_state.harness)
        .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
    if draft_state.telemetry.with_ref(|_| ()).is_none() {
        draft_state.telemetry.set(Arc::new(RecordingSink::default()));
    }
    runtime
}

/// Runs `action` against a workflow freshly built over the harness database.
///
/// Every call opens a new `SQLite` cache backend, so drafts only carry over
/// through the database file.
pub(crate) fn with_workflow<R>(
    draft_state: &DraftState,
    action: impl FnOnce(&Harness, &PreparationWorkflow) -> R,
) -> R {
    let telemetry = draft_state
        .telemetry
        .get()
        .unwrap_or_else(|| panic!("telemetry sink not initialised"));
    draft_state
        .harness
        .with_ref(|harness| {
            let backend = SqliteCacheBackend::new(harness.database_url.as_str())
                .unwrap_or_else(|error| panic!("cache backend should open: {error}"));
            let workflow = PreparationWorkflow::new(
                Arc::clone(&harness.gateway),
                Arc::clone(&harness.store),
                PreparationCache::new(Arc::new(backend)),
                harness.resolver.clone(),
            )
            .with_telemetry(telemetry);
            action(harness, &workflow)
        })
        .unwrap_or_else(|| panic!("harness not initialised"))
}

/// Keeps a successful draft or the error of a failed step.
pub(crate) fn remember_draft(
    draft_state: &DraftState,
    result: Result<PreparationDraft, ServiceError>,
) {
    match result {
        Ok(draft) => {
            let _had_previous_error = draft_state.error.take().is_some();
            draft_state.draft.set(draft);
        }
        Err(error) => draft_state.error.set(error),
    }
}

/// Strips the quotes Gherkin string arguments arrive with.
pub(crate) fn unquote(value: &str) -> String {
    value.trim_matches('"').to_owned()
}
