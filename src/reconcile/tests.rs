//! Planning and apply tests for reconciliation.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::{ReconcileKey, ReconcileSummary, Reconciler, has_changed_from, plan_reconciliation};
use crate::error::ServiceError;
use crate::github::RemotePullRequest;
use crate::github::models::test_support::{open_pull_request, remote_user};
use crate::persistence::{
    DEFAULT_USER_GRADE, MockPullRequestStore, PersistenceError, PullRequestFields, PullRequestId,
    PullRequestRecord, UserRecord,
};
use crate::telemetry::TelemetryEvent;
use crate::telemetry::test_support::RecordingSink;

const REPOSITORY_ID: i64 = 1;

/// Stored counterpart of `open_pull_request(number, title)` with local id
/// `100 + number` and author 1.
fn local(number: u64, title: &str) -> PullRequestRecord {
    let remote = open_pull_request(number, title);
    PullRequestRecord {
        id: PullRequestId::new(100 + i64::try_from(number).unwrap_or_default()),
        fields: PullRequestFields {
            repository_id: REPOSITORY_ID,
            author_id: 1,
            github_id: remote.github_id,
            github_pr_number: number,
            title: title.to_owned(),
            body: None,
            state: remote.state,
            base_branch: remote.base,
            head_branch: remote.head,
            summary: None,
            html_url: remote.html_url,
        },
    }
}

#[fixture]
fn actor() -> UserRecord {
    UserRecord {
        id: 1,
        github_id: 1,
        github_username: "octocat".to_owned(),
        github_email: None,
        avatar_url: None,
        user_type: "User".to_owned(),
        reward_points: 0,
        user_grade: DEFAULT_USER_GRADE.to_owned(),
    }
}

fn registered(id: i64, github_id: u64) -> UserRecord {
    UserRecord {
        id,
        github_id,
        ..actor()
    }
}

#[rstest]
fn plans_create_update_and_delete() {
    let locals = vec![local(1, "One"), local(2, "Two"), local(3, "Three")];
    let remotes = vec![
        open_pull_request(2, "Two"),
        open_pull_request(3, "Three, revised"),
        open_pull_request(4, "Four"),
    ];

    let plan = plan_reconciliation(&locals, &remotes, ReconcileKey::PullRequestNumber);

    let created: Vec<u64> = plan.creates.iter().map(|entry| entry.number).collect();
    assert_eq!(created, vec![4]);
    assert_eq!(plan.updates.len(), 1);
    let update = plan.updates.first().expect("one update");
    assert_eq!(update.id, PullRequestId::new(103));
    assert_eq!(update.fields.title, "Three, revised");
    assert_eq!(update.fields.author_id, 1);
    assert_eq!(plan.deletes, vec![PullRequestId::new(101)]);
    assert_eq!(plan.unchanged, 1);
}

#[rstest]
fn second_pass_stages_nothing() {
    let remotes = vec![open_pull_request(2, "Two"), open_pull_request(3, "Three")];
    let locals = vec![local(1, "One"), local(2, "Two"), local(3, "Three, old")];

    let first = plan_reconciliation(&locals, &remotes, ReconcileKey::PullRequestNumber);
    let mut applied: Vec<PullRequestRecord> = locals
        .into_iter()
        .filter(|record| !first.deletes.contains(&record.id))
        .collect();
    for update in &first.updates {
        if let Some(slot) = applied.iter_mut().find(|record| record.id == update.id) {
            *slot = update.clone();
        }
    }
    let second = plan_reconciliation(&applied, &remotes, ReconcileKey::PullRequestNumber);

    assert!(second.is_empty());
    assert_eq!(second.unchanged, 2);
}

#[rstest]
fn empty_remote_deletes_everything() {
    let locals = vec![local(1, "One"), local(2, "Two")];

    let plan = plan_reconciliation(&locals, &[], ReconcileKey::PullRequestNumber);

    assert!(plan.creates.is_empty());
    assert!(plan.updates.is_empty());
    assert_eq!(
        plan.deletes,
        vec![PullRequestId::new(101), PullRequestId::new(102)]
    );
}

#[rstest]
fn duplicate_remote_entries_are_staged_once() {
    let remotes = vec![open_pull_request(4, "Four"), open_pull_request(4, "Four again")];

    let plan = plan_reconciliation(&[], &remotes, ReconcileKey::PullRequestNumber);

    assert_eq!(plan.creates.len(), 1);
    assert_eq!(
        plan.creates.first().and_then(|entry| entry.title.as_deref()),
        Some("Four")
    );
}

#[rstest]
fn global_id_key_keeps_identity_across_renumbering() {
    let locals = vec![local(5, "Five")];
    let renumbered = RemotePullRequest {
        number: 6,
        ..open_pull_request(5, "Five")
    };

    let plan = plan_reconciliation(&locals, &[renumbered.clone()], ReconcileKey::GlobalId);

    assert!(plan.creates.is_empty());
    assert!(plan.deletes.is_empty());
    let update = plan.updates.first().expect("renumbering is an update");
    assert_eq!(update.id, PullRequestId::new(105));
    assert_eq!(update.fields.github_pr_number, 6);

    let by_number = plan_reconciliation(&locals, &[renumbered], ReconcileKey::PullRequestNumber);
    assert!(by_number.creates.is_empty());
    assert!(by_number.deletes.is_empty());
    let adopted = by_number.updates.first().expect("renumbering is an update");
    assert_eq!(adopted.id, PullRequestId::new(105));
    assert_eq!(adopted.fields.github_pr_number, 6);
}

#[rstest]
fn number_key_adopts_renumbered_record_among_other_changes() {
    let locals = vec![local(7, "Seven"), local(9, "Nine")];
    let remotes = vec![
        RemotePullRequest {
            number: 8,
            ..open_pull_request(7, "Seven")
        },
        open_pull_request(10, "Ten"),
    ];

    let plan = plan_reconciliation(&locals, &remotes, ReconcileKey::PullRequestNumber);

    let created: Vec<u64> = plan.creates.iter().map(|entry| entry.number).collect();
    assert_eq!(created, vec![10]);
    let updated: Vec<(PullRequestId, u64)> = plan
        .updates
        .iter()
        .map(|record| (record.id, record.fields.github_pr_number))
        .collect();
    assert_eq!(updated, vec![(PullRequestId::new(107), 8)]);
    assert_eq!(plan.deletes, vec![PullRequestId::new(109)]);
}

#[rstest]
fn global_id_key_reuses_record_holding_a_recycled_number() {
    let locals = vec![local(3, "Three")];
    let replacement = RemotePullRequest {
        github_id: 77,
        ..open_pull_request(3, "Three, reopened elsewhere")
    };

    let plan = plan_reconciliation(&locals, &[replacement], ReconcileKey::GlobalId);

    assert!(plan.creates.is_empty());
    assert!(plan.deletes.is_empty());
    let update = plan.updates.first().expect("recycled number is an update");
    assert_eq!(update.id, PullRequestId::new(103));
    assert_eq!(update.fields.github_id, 77);
}

#[rstest]
#[case::title(RemotePullRequest { title: Some("Other".to_owned()), ..open_pull_request(1, "One") }, true)]
#[case::body(RemotePullRequest { body: Some("Text".to_owned()), ..open_pull_request(1, "One") }, true)]
#[case::state(RemotePullRequest { state: "closed".to_owned(), ..open_pull_request(1, "One") }, true)]
#[case::base(RemotePullRequest { base: "develop".to_owned(), ..open_pull_request(1, "One") }, true)]
#[case::head(RemotePullRequest { head: "feature/y".to_owned(), ..open_pull_request(1, "One") }, true)]
#[case::github_id(RemotePullRequest { github_id: 42, ..open_pull_request(1, "One") }, true)]
#[case::reviewers_only(
    RemotePullRequest { requested_reviewers: vec![remote_user(2, "hubot")], ..open_pull_request(1, "One") },
    false
)]
#[case::same(open_pull_request(1, "One"), false)]
fn detects_tracked_field_changes(#[case] remote: RemotePullRequest, #[case] expected: bool) {
    let record = local(1, "One");
    assert_eq!(
        has_changed_from(&record.fields, &remote, ReconcileKey::PullRequestNumber),
        expected
    );
}

#[rstest]
#[case("number", ReconcileKey::PullRequestNumber)]
#[case("pull-request-number", ReconcileKey::PullRequestNumber)]
#[case("global-id", ReconcileKey::GlobalId)]
#[case("GLOBAL_ID", ReconcileKey::GlobalId)]
fn parses_reconcile_keys(#[case] raw: &str, #[case] expected: ReconcileKey) {
    assert_eq!(raw.parse::<ReconcileKey>().ok(), Some(expected));
}

#[rstest]
fn rejects_unknown_reconcile_key() {
    assert!(matches!(
        "sha".parse::<ReconcileKey>(),
        Err(ServiceError::ValidationFailed { .. })
    ));
}

#[rstest]
fn apply_writes_creates_and_updates_before_deletes(actor: UserRecord) {
    let mut store = MockPullRequestStore::new();
    let mut sequence = mockall::Sequence::new();
    store
        .expect_list_by_repository()
        .returning(|_| Ok(vec![local(1, "One"), local(2, "Two"), local(3, "Three")]));
    store
        .expect_find_or_register_user()
        .withf(|user| user.github_id == 7 && user.github_username == "hubot")
        .times(1)
        .returning(|user| Ok(registered(7, user.github_id)));
    store
        .expect_save_all()
        .withf(|creates, updates| {
            creates.len() == 1
                && creates.first().is_some_and(|create| {
                    create.fields.github_pr_number == 4
                        && create.fields.author_id == 1
                        && create.reviewer_ids == vec![7]
                })
                && updates.len() == 1
                && updates
                    .first()
                    .is_some_and(|update| update.id == PullRequestId::new(103))
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(()));
    store
        .expect_delete_all()
        .withf(|ids| ids == [PullRequestId::new(101)])
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|ids| Ok(ids.len()));
    let sink = Arc::new(RecordingSink::default());
    let reconciler = Reconciler::new(Arc::new(store)).with_telemetry(sink.clone());

    let new_entry = RemotePullRequest {
        requested_reviewers: vec![remote_user(7, "hubot"), remote_user(7, "hubot")],
        ..open_pull_request(4, "Four")
    };
    let remotes = vec![
        open_pull_request(2, "Two"),
        open_pull_request(3, "Three, revised"),
        new_entry,
    ];
    let summary = reconciler
        .reconcile(REPOSITORY_ID, &remotes, &actor)
        .expect("reconcile should succeed");

    assert_eq!(
        summary,
        ReconcileSummary {
            created: 1,
            updated: 1,
            deleted: 1,
            unchanged: 1,
        }
    );
    assert_eq!(
        sink.take(),
        vec![TelemetryEvent::PullRequestsReconciled {
            repository_id: REPOSITORY_ID,
            created: 1,
            updated: 1,
            deleted: 1,
        }]
    );
}

#[rstest]
fn ghost_author_falls_back_to_actor(actor: UserRecord) {
    let mut store = MockPullRequestStore::new();
    store.expect_list_by_repository().returning(|_| Ok(Vec::new()));
    store
        .expect_save_all()
        .withf(|creates, _| {
            creates
                .first()
                .is_some_and(|create| create.fields.author_id == 1)
        })
        .times(1)
        .returning(|_, _| Ok(()));
    let reconciler = Reconciler::new(Arc::new(store));
    let ghost = RemotePullRequest {
        author: None,
        ..open_pull_request(9, "Orphan")
    };

    let summary = reconciler
        .reconcile(REPOSITORY_ID, &[ghost], &actor)
        .expect("reconcile should succeed");

    assert_eq!(summary.created, 1);
}

#[rstest]
fn registration_failure_aborts_before_writing(actor: UserRecord) {
    let mut store = MockPullRequestStore::new();
    store.expect_list_by_repository().returning(|_| Ok(vec![local(1, "One")]));
    store.expect_find_or_register_user().returning(|_| {
        Err(PersistenceError::WriteFailed {
            message: "users table locked".to_owned(),
        })
    });
    store.expect_save_all().never();
    store.expect_delete_all().never();
    let sink = Arc::new(RecordingSink::default());
    let reconciler = Reconciler::new(Arc::new(store)).with_telemetry(sink.clone());
    let stranger = RemotePullRequest {
        author: Some(remote_user(55, "stranger")),
        ..open_pull_request(2, "Two")
    };

    let result = reconciler.reconcile(REPOSITORY_ID, &[stranger], &actor);

    assert!(matches!(
        result,
        Err(ServiceError::PersistenceFailure { .. })
    ));
    assert!(sink.take().is_empty());
}

#[rstest]
fn unchanged_listing_writes_nothing(actor: UserRecord) {
    let mut store = MockPullRequestStore::new();
    store
        .expect_list_by_repository()
        .returning(|_| Ok(vec![local(1, "One")]));
    store.expect_save_all().never();
    store.expect_delete_all().never();
    let reconciler = Reconciler::new(Arc::new(store));

    let summary = reconciler
        .reconcile(REPOSITORY_ID, &[open_pull_request(1, "One")], &actor)
        .expect("reconcile should succeed");

    assert_eq!(
        summary,
        ReconcileSummary {
            unchanged: 1,
            ..ReconcileSummary::default()
        }
    );
}

mod sqlite {
    use std::sync::Arc;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::super::{ReconcileKey, Reconciler};
    use crate::github::RemotePullRequest;
    use crate::github::models::test_support::open_pull_request;
    use crate::persistence::{
        NewUser, PullRequestStore, SqliteStore, UserRecord, migrate_database,
    };
    use crate::telemetry::NoopTelemetrySink;

    fn open_store(temp_dir: &TempDir) -> (Arc<SqliteStore>, i64, UserRecord) {
        let database_url = temp_dir
            .path()
            .join("prsync.sqlite")
            .to_string_lossy()
            .into_owned();
        migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");
        let store = SqliteStore::new(database_url).expect("store should build");
        let repository_id = store
            .find_or_create_repository("octo/repo")
            .expect("repository should be created")
            .id;
        let actor = store
            .find_or_register_user(&NewUser {
                github_id: 1,
                github_username: "octocat".to_owned(),
                github_email: None,
                avatar_url: None,
                user_type: "User".to_owned(),
            })
            .expect("actor should register");
        (Arc::new(store), repository_id, actor)
    }

    #[rstest]
    #[case::by_number(ReconcileKey::PullRequestNumber)]
    #[case::by_global_id(ReconcileKey::GlobalId)]
    fn renumbered_pull_request_keeps_its_row(#[case] key: ReconcileKey) {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let (store, repository_id, actor) = open_store(&temp_dir);
        let reconciler = Reconciler::new(Arc::clone(&store) as Arc<dyn PullRequestStore>)
            .with_key(key);

        reconciler
            .reconcile(repository_id, &[open_pull_request(7, "Seven")], &actor)
            .expect("first pass should succeed");
        let before = store
            .list_by_repository(repository_id)
            .expect("listing should succeed");
        let renumbered = RemotePullRequest {
            number: 8,
            ..open_pull_request(7, "Seven")
        };
        let summary = reconciler
            .reconcile(repository_id, &[renumbered], &actor)
            .expect("renumbering should reconcile");
        let after = store
            .list_by_repository(repository_id)
            .expect("listing should succeed");

        assert_eq!((summary.created, summary.updated, summary.deleted), (0, 1, 0));
        let ids = |records: &[crate::persistence::PullRequestRecord]| {
            records.iter().map(|record| record.id).collect::<Vec<_>>()
        };
        assert_eq!(ids(&before), ids(&after));
        assert_eq!(
            after.first().map(|record| record.fields.github_pr_number),
            Some(8)
        );
    }

    #[rstest]
    fn recycled_number_under_global_id_reconciles() {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let (store, repository_id, actor) = open_store(&temp_dir);
        let reconciler = Reconciler::new(Arc::clone(&store) as Arc<dyn PullRequestStore>)
            .with_key(ReconcileKey::GlobalId);
        reconciler
            .reconcile(repository_id, &[open_pull_request(3, "Three")], &actor)
            .expect("first pass should succeed");

        let replacement = RemotePullRequest {
            github_id: 77,
            ..open_pull_request(3, "Three, again")
        };
        reconciler
            .reconcile(repository_id, &[replacement], &actor)
            .expect("recycled number should reconcile");

        let records = store
            .list_by_repository(repository_id)
            .expect("listing should succeed");
        let stored: Vec<(u64, u64)> = records
            .iter()
            .map(|record| (record.fields.github_pr_number, record.fields.github_id))
            .collect();
        assert_eq!(stored, vec![(3, 77)]);
    }
}
