//! Given steps for draft promotion behavioural tests.

use rstest_bdd_macros::given;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::draft_promotion_bdd_state::{DraftState, ensure_harness, unquote};
use crate::support::pull_request_json;

fn comparison_body(base: &str, head: &str, status: &str, ahead_by: u64) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "ahead_by": ahead_by,
        "behind_by": 0,
        "total_commits": ahead_by,
        "html_url": format!("https://github.com/owner/repo/compare/{base}...{head}"),
        "commits": [{
            "sha": "0123456789abcdef",
            "commit": {
                "message": "Add parser",
                "author": { "name": "Octo", "date": "2025-01-01T00:00:00Z" },
                "committer": { "name": "Octo", "date": "2025-01-01T00:00:00Z" }
            }
        }],
        "files": [{
            "filename": "src/lib.rs",
            "status": "added",
            "additions": 2,
            "deletions": 0,
            "changes": 2,
            "patch": "@@ -0,0 +1,2 @@\n+one\n+two"
        }]
    })
}

fn mount_comparison(draft_state: &DraftState, route: &str, body: serde_json::Value) {
    let runtime = ensure_harness(draft_state);
    let mock = Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/owner/repo/compare/{route}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1..);

    draft_state
        .harness
        .with_ref(|harness| runtime.block_on(mock.mount(&harness.server)))
        .unwrap_or_else(|| panic!("harness not initialised"));
}

#[given("a migrated database and a mock GitHub for owner/repo")]
fn migrated_harness(draft_state: &DraftState) {
    let _runtime = ensure_harness(draft_state);
}

#[given("GitHub compares {base} and {head} at {route} as {ahead:u64} commit ahead")]
fn ahead_comparison(
    draft_state: &DraftState,
    base: String,
    head: String,
    route: String,
    ahead: u64,
) {
    let body = comparison_body(&unquote(&base), &unquote(&head), "ahead", ahead);
    mount_comparison(draft_state, &unquote(&route), body);
}

#[given("GitHub compares {base} and {head} at {route} as identical")]
fn identical_comparison(draft_state: &DraftState, base: String, head: String, route: String) {
    let body = comparison_body(&unquote(&base), &unquote(&head), "identical", 0);
    mount_comparison(draft_state, &unquote(&route), body);
}

#[given("GitHub accepts pull request {number:u64} titled {title} from {head} into {base}")]
fn accepted_pull_request(
    draft_state: &DraftState,
    number: u64,
    title: String,
    head: String,
    base: String,
) {
    let runtime = ensure_harness(draft_state);
    let title_text = unquote(&title);
    let mock = Mock::given(method("POST"))
        .and(path("/api/v3/repos/owner/repo/pulls"))
        .and(body_json(serde_json::json!({
            "title": title_text,
            "head": unquote(&head),
            "base": unquote(&base)
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(pull_request_json(number, &title_text)),
        )
        .expect(1);

    draft_state
        .harness
        .with_ref(|harness| runtime.block_on(mock.mount(&harness.server)))
        .unwrap_or_else(|| panic!("harness not initialised"));
}
