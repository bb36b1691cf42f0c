//! When steps for draft promotion behavioural tests.

use prsync::preparation::EnrichRequest;
use rstest_bdd_macros::when;

use crate::draft_promotion_bdd_state::{
    DraftState, ensure_harness, remember_draft, unquote, with_workflow,
};

#[when("a draft of {head} into {base} is started")]
fn start_draft(draft_state: &DraftState, head: String, base: String) {
    let runtime = ensure_harness(draft_state);
    let result = with_workflow(draft_state, |harness, workflow| {
        runtime.block_on(workflow.start_preparation(
            harness.repository.id,
            &unquote(&head),
            &unquote(&base),
            &harness.actor,
        ))
    });
    remember_draft(draft_state, result);
}

#[when("the draft of {head} into {base} is titled {title} with summary {summary}")]
fn enrich_draft(
    draft_state: &DraftState,
    head: String,
    base: String,
    title: String,
    summary: String,
) {
    let runtime = ensure_harness(draft_state);
    let request = EnrichRequest {
        source: unquote(&head),
        target: unquote(&base),
        title: Some(unquote(&title)),
        summary: Some(unquote(&summary)),
        ..EnrichRequest::default()
    };
    let result = with_workflow(draft_state, |harness, workflow| {
        runtime.block_on(workflow.enrich(harness.repository.id, request))
    });
    remember_draft(draft_state, result);
}

#[when("a fresh workflow reloads the draft of {head} into {base}")]
fn reload_draft(draft_state: &DraftState, head: String, base: String) {
    let _had_previous_draft = draft_state.draft.take().is_some();
    let result = with_workflow(draft_state, |harness, workflow| {
        workflow.draft(harness.repository.id, &unquote(&head), &unquote(&base))
    });
    remember_draft(draft_state, result);
}

#[when("the draft of {head} into {base} is promoted")]
fn promote_draft(draft_state: &DraftState, head: String, base: String) {
    let runtime = ensure_harness(draft_state);
    let result = with_workflow(draft_state, |harness, workflow| {
        runtime.block_on(workflow.promote_draft(
            harness.repository.id,
            &unquote(&head),
            &unquote(&base),
        ))
    });
    match result {
        Ok(record) => draft_state.record.set(record),
        Err(error) => draft_state.error.set(error),
    }
}

#[when("the draft of {head} into {base} is discarded")]
fn discard_draft(draft_state: &DraftState, head: String, base: String) {
    with_workflow(draft_state, |harness, workflow| {
        workflow.discard(harness.repository.id, &unquote(&head), &unquote(&base))
    })
    .unwrap_or_else(|error| panic!("discard should succeed: {error}"));
}
