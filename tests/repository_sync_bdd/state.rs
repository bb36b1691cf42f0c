//! Scenario state and helpers for repository sync BDD tests.

use std::collections::HashMap;
use std::sync::Arc;

use prsync::persistence::{PullRequestId, PullRequestRecord};
use prsync::preparation::{PreparationCache, SqliteCacheBackend};
use prsync::service::PullRequestDetail;
use prsync::telemetry::test_support::RecordingSink;
use prsync::{
    LocalPullRequestService, PreparationWorkflow, PullRequestService, Reconciler, ServiceError,
};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::support::Harness;
use crate::support::runtime::{SharedRuntime, ensure_runtime_and_harness};

/// State shared across steps in a repository sync scenario.
#[derive(ScenarioState, Default)]
pub(crate) struct SyncState {
    pub(crate) runtime: Slot<SharedRuntime>,
    /// Migrated database, mock GitHub, and the registered repository.
    pub(crate) harness: Slot<Harness>,
    pub(crate) telemetry: Slot<Arc<RecordingSink>>,
    /// Open pull requests GitHub returns on the next sync.
    pub(crate) listing: Slot<Vec<serde_json::Value>>,
    /// When set, the listing endpoint answers with a server error.
    pub(crate) listing_fails: Slot<bool>,
    /// Pull request whose commits and files GitHub serves.
    pub(crate) detail_number: Slot<u64>,
    /// Local ids by pull request number after the last setup sync.
    pub(crate) known_ids: Slot<HashMap<u64, PullRequestId>>,
    pub(crate) previous_records: Slot<Vec<PullRequestRecord>>,
    pub(crate) records: Slot<Vec<PullRequestRecord>>,
    pub(crate) detail: Slot<PullRequestDetail>,
    pub(crate) error: Slot<ServiceError>,
}

/// Ensures the runtime, harness, and telemetry sink are initialised.
pub(crate) fn ensure_harness(sync_state: &SyncState) -> SharedRuntime {
    let runtime = ensure_runtime_and_harness(&sync_state.runtime, &sync_state.harness)
        .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
    if sync_state.telemetry.with_ref(|_| ()).is_none() {
        sync_state.telemetry.set(Arc::new(RecordingSink::default()));
    }
    runtime
}

fn build_service(harness: &Harness, telemetry: Arc<RecordingSink>) -> LocalPullRequestService {
    let backend = SqliteCacheBackend::new(harness.database_url.as_str())
        .unwrap_or_else(|error| panic!("cache backend should open: {error}"));
    let workflow = PreparationWorkflow::new(
        Arc::clone(&harness.gateway),
        Arc::clone(&harness.store),
        PreparationCache::new(Arc::new(backend)),
        harness.resolver.clone(),
    );
    LocalPullRequestService::new(
        Arc::clone(&harness.gateway),
        Arc::clone(&harness.store),
        harness.resolver.clone(),
        Arc::new(workflow),
        Reconciler::new(Arc::clone(&harness.store)).with_telemetry(telemetry),
    )
}

/// Builds the service over the scenario's harness and telemetry sink.
pub(crate) fn with_service<R>(
    sync_state: &SyncState,
    action: impl FnOnce(&Harness, &LocalPullRequestService) -> R,
) -> R {
    let telemetry = sync_state
        .telemetry
        .get()
        .unwrap_or_else(|| panic!("telemetry sink not initialised"));
    sync_state
        .harness
        .with_ref(|harness| {
            let service = build_service(harness, telemetry);
            action(harness, &service)
        })
        .unwrap_or_else(|| panic!("harness not initialised"))
}

async fn mount_remote(
    harness: &Harness,
    listing: Vec<serde_json::Value>,
    listing_fails: bool,
    detail_number: Option<u64>,
) {
    harness.server.reset().await;
    let pulls = Mock::given(method("GET")).and(path("/api/v3/repos/owner/repo/pulls"));
    let response = if listing_fails {
        ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "message": "Server Error",
            "documentation_url": "https://docs.github.com/rest"
        }))
    } else {
        ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(listing))
    };
    pulls
        .and(query_param("state", "open"))
        .respond_with(response)
        .mount(&harness.server)
        .await;

    let Some(number) = detail_number else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/owner/repo/pulls/{number}/commits")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "sha": "0123456789abcdef",
            "commit": {
                "message": "Add parser\n\nHandles hunks.",
                "author": { "name": "Octo", "email": "octo@example.invalid", "date": "2025-01-01T00:00:00Z" },
                "committer": { "name": "Octo", "email": "octo@example.invalid", "date": "2025-01-01T00:00:00Z" }
            }
        }])))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/owner/repo/pulls/{number}/files")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "filename": "src/lib.rs",
            "status": "modified",
            "additions": 1,
            "deletions": 0,
            "changes": 1,
            "patch": "@@ -1 +1,2 @@\n line\n+added"
        }])))
        .mount(&harness.server)
        .await;
}

/// Serves the current listing and reconciles the repository once.
pub(crate) fn run_sync(sync_state: &SyncState) -> Result<Vec<PullRequestRecord>, ServiceError> {
    let runtime = ensure_harness(sync_state);
    let listing = sync_state.listing.get().unwrap_or_default();
    let listing_fails = sync_state.listing_fails.get().unwrap_or(false);
    let detail_number = sync_state.detail_number.get();

    with_service(sync_state, |harness, service| {
        runtime.block_on(async {
            mount_remote(harness, listing, listing_fails, detail_number).await;
            service.sync(harness.repository.id, &harness.actor).await
        })
    })
}

/// Lists the records currently stored for the repository.
pub(crate) fn local_records(sync_state: &SyncState) -> Vec<PullRequestRecord> {
    let runtime = ensure_harness(sync_state);
    with_service(sync_state, |harness, service| {
        runtime.block_on(service.list(harness.repository.id))
    })
    .unwrap_or_else(|error| panic!("list should succeed: {error}"))
}
