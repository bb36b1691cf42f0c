//! Then steps for draft promotion behavioural tests.

use prsync::ServiceError;
use prsync::preparation::PreparationDraft;
use prsync::telemetry::TelemetryEvent;
use rstest_bdd_macros::then;

use crate::draft_promotion_bdd_state::{DraftState, ensure_harness, unquote, with_workflow};

fn current_draft(draft_state: &DraftState) -> PreparationDraft {
    draft_state.draft.get().unwrap_or_else(|| {
        let error = draft_state.error.get();
        panic!("draft missing; last error: {error:?}")
    })
}

fn last_error(draft_state: &DraftState) -> ServiceError {
    draft_state
        .error
        .get()
        .unwrap_or_else(|| panic!("expected the last step to fail"))
}

#[then("the draft is ready to promote")]
fn draft_is_creatable(draft_state: &DraftState) {
    assert!(current_draft(draft_state).is_creatable());
}

#[then("the draft has nothing to merge")]
fn draft_is_not_creatable(draft_state: &DraftState) {
    assert!(!current_draft(draft_state).is_creatable());
}

#[then("the draft is titled {title} with summary {summary}")]
fn draft_fields(draft_state: &DraftState, title: String, summary: String) {
    let draft = current_draft(draft_state);

    assert_eq!(draft.title(), Some(unquote(&title).as_str()));
    assert_eq!(draft.summary(), Some(unquote(&summary).as_str()));
}

#[then("the draft lists {count:usize} changed files")]
fn draft_file_count(draft_state: &DraftState, count: usize) {
    assert_eq!(current_draft(draft_state).comparison().files.len(), count);
}

#[then("the draft is authored by {login}")]
fn draft_author(draft_state: &DraftState, login: String) {
    assert_eq!(current_draft(draft_state).author().login, unquote(&login));
}

#[then("local pull request {number:u64} is stored with summary {summary}")]
fn stored_pull_request(draft_state: &DraftState, number: u64, summary: String) {
    let record = draft_state.record.get().unwrap_or_else(|| {
        let error = draft_state.error.get();
        panic!("promotion did not return a record; last error: {error:?}")
    });
    let (actor_id, stored) = draft_state
        .harness
        .with_ref(|harness| (harness.actor.id, harness.store.find_by_id(record.id)))
        .unwrap_or_else(|| panic!("harness not initialised"));
    let stored_record = stored.unwrap_or_else(|error| panic!("lookup should succeed: {error}"));

    assert_eq!(record.fields.github_pr_number, number);
    assert_eq!(record.fields.summary, Some(unquote(&summary)));
    assert_eq!(record.fields.author_id, actor_id);
    assert_eq!(stored_record.as_ref(), Some(&record));
}

#[then("promotion of pull request {number:u64} was reported")]
fn promotion_reported(draft_state: &DraftState, number: u64) {
    let repository_id = draft_state
        .harness
        .with_ref(|harness| harness.repository.id)
        .unwrap_or_else(|| panic!("harness not initialised"));
    let events = draft_state
        .telemetry
        .with_ref(|sink| sink.take())
        .unwrap_or_else(|| panic!("telemetry sink not initialised"));

    assert_eq!(
        events,
        vec![TelemetryEvent::DraftPromoted {
            repository_id,
            github_pr_number: number,
        }]
    );
}

#[then("the workflow reports a conflict")]
fn reports_conflict(draft_state: &DraftState) {
    let error = last_error(draft_state);

    assert!(
        matches!(error, ServiceError::Conflict { .. }),
        "expected Conflict, got {error:?}"
    );
}

#[then("the workflow reports a validation failure")]
fn reports_validation_failure(draft_state: &DraftState) {
    let error = last_error(draft_state);

    assert!(
        matches!(error, ServiceError::ValidationFailed { .. }),
        "expected ValidationFailed, got {error:?}"
    );
}

#[then("no draft of {head} into {base} remains")]
fn draft_is_gone(draft_state: &DraftState, head: String, base: String) {
    let result = with_workflow(draft_state, |harness, workflow| {
        workflow.draft(harness.repository.id, &unquote(&head), &unquote(&base))
    });

    assert!(matches!(result, Err(ServiceError::NotFound { .. })));
}

#[then("the GitHub API mocks are satisfied")]
fn verify_mocks(draft_state: &DraftState) {
    let runtime = ensure_harness(draft_state);
    draft_state
        .harness
        .with_ref(|harness| runtime.block_on(harness.server.verify()))
        .unwrap_or_else(|| panic!("harness not initialised"));
}
