//! Shared test utilities.

pub mod runtime;

use std::sync::Arc;

use prsync::github::SourceControlGateway;
use prsync::persistence::{
    NewUser, PullRequestStore, RepositoryRecord, SqliteStore, UserRecord, migrate_database,
};
use prsync::resolve::RepositoryResolver;
use prsync::telemetry::NoopTelemetrySink;
use prsync::{OctocrabGateway, PersonalAccessToken, RepositoryLocator};
use tempfile::TempDir;
use wiremock::MockServer;

/// Creates a temporary directory for database tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// A migrated database, a mock GitHub, and the collaborators wired to both.
pub struct Harness {
    /// Keeps the database file alive.
    _directory: TempDir,
    pub database_url: String,
    pub server: MockServer,
    pub gateway: Arc<dyn SourceControlGateway>,
    pub store: Arc<dyn PullRequestStore>,
    pub resolver: RepositoryResolver,
    pub repository: RepositoryRecord,
    pub actor: UserRecord,
}

impl Harness {
    /// Starts the mock server and registers `owner/repo` and `octocat`.
    ///
    /// # Panics
    ///
    /// Panics if any part of the setup fails.
    pub async fn start() -> Self {
        let directory = create_temp_dir();
        let database_url = directory
            .path()
            .join("prsync.sqlite")
            .to_string_lossy()
            .into_owned();
        migrate_database(&database_url, &NoopTelemetrySink)
            .unwrap_or_else(|error| panic!("migration failed: {error}"));

        let server = MockServer::start().await;
        let api_base = format!("{}/api/v3", server.uri());
        let locator = RepositoryLocator::from_full_name(&api_base, "owner/repo")
            .unwrap_or_else(|error| panic!("locator should parse: {error}"));
        let token = PersonalAccessToken::new("valid-token")
            .unwrap_or_else(|error| panic!("token should be valid: {error}"));
        let gateway = OctocrabGateway::for_token(&token, &locator)
            .unwrap_or_else(|error| panic!("gateway should build: {error}"));

        let store = SqliteStore::new(database_url.as_str())
            .unwrap_or_else(|error| panic!("store should open: {error}"));
        let repository = store
            .find_or_create_repository("owner/repo")
            .unwrap_or_else(|error| panic!("repository should register: {error}"));
        let actor = store
            .find_or_register_user(&NewUser {
                github_id: 1,
                github_username: "octocat".to_owned(),
                github_email: None,
                avatar_url: None,
                user_type: "User".to_owned(),
            })
            .unwrap_or_else(|error| panic!("actor should register: {error}"));

        Self {
            _directory: directory,
            database_url,
            server,
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            resolver: RepositoryResolver::new(api_base),
            repository,
            actor,
        }
    }
}

/// GitHub's JSON for an open pull request authored by `octocat`.
pub fn pull_request_json(number: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 5000 + number,
        "number": number,
        "title": title,
        "body": "body",
        "state": "open",
        "html_url": format!("https://github.com/owner/repo/pull/{number}"),
        "user": { "id": 1, "login": "octocat", "type": "User" },
        "base": { "ref": "main" },
        "head": { "ref": format!("feature/{number}") },
        "requested_reviewers": []
    })
}
