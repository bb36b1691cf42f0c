//! Collaborators shared by the GitHub-facing modes.

use std::sync::Arc;

use prsync::github::SourceControlGateway;
use prsync::persistence::{NewUser, PullRequestStore, RepositoryRecord, SqliteStore, UserRecord};
use prsync::preparation::{PreparationCache, SqliteCacheBackend};
use prsync::resolve::RepositoryResolver;
use prsync::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use prsync::{
    OctocrabGateway, PersonalAccessToken, PreparationWorkflow, PrsyncConfig, Reconciler,
    RepositoryLocator, ServiceError,
};
use tracing::debug;

/// Gateway, store, and identities resolved for one invocation.
pub struct Context {
    /// GitHub gateway for the configured repository.
    pub gateway: Arc<dyn SourceControlGateway>,
    /// Local `SQLite` store.
    pub store: Arc<dyn PullRequestStore>,
    /// Repository named by `owner`/`repo`.
    pub repository: RepositoryRecord,
    /// Local record of the token's account.
    pub actor: UserRecord,
    /// Maps repository ids back to GitHub locators.
    pub resolver: RepositoryResolver,
    telemetry: Arc<dyn TelemetrySink>,
    database_url: String,
}

impl Context {
    /// Opens the store, authenticates against GitHub, and registers the
    /// repository and calling user locally.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] for missing configuration,
    /// [`ServiceError::NotAuthorized`] for a missing or rejected token, and
    /// persistence or remote failures otherwise.
    pub async fn connect(config: &PrsyncConfig) -> Result<Self, ServiceError> {
        let database_url = config.require_database_url()?;
        let (owner, repo) = config.require_repository_info()?;
        let token = PersonalAccessToken::new(config.resolve_token()?)?;
        let locator =
            RepositoryLocator::from_full_name(config.api_base(), &format!("{owner}/{repo}"))?;

        let gateway = OctocrabGateway::for_token(&token, &locator)?;
        let store = SqliteStore::new(database_url)?;
        let repository = store.find_or_create_repository(&locator.full_name())?;
        let remote_actor = gateway.authenticated_user().await?;
        let actor = store.find_or_register_user(&NewUser::from(&remote_actor))?;
        debug!(
            repository = %repository.full_name,
            actor = %actor.github_username,
            "connected"
        );

        Ok(Self {
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            repository,
            actor,
            resolver: RepositoryResolver::new(config.api_base()),
            telemetry: Arc::new(StderrJsonlTelemetrySink),
            database_url: database_url.to_owned(),
        })
    }

    /// Preparation workflow caching drafts in the same database.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PersistenceFailure`] when the cache backend
    /// cannot be opened.
    pub fn workflow(&self) -> Result<PreparationWorkflow, ServiceError> {
        let backend = SqliteCacheBackend::new(self.database_url.as_str())?;
        Ok(PreparationWorkflow::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.store),
            PreparationCache::new(Arc::new(backend)),
            self.resolver.clone(),
        )
        .with_telemetry(Arc::clone(&self.telemetry)))
    }

    /// Reconciler writing through the shared store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] for an unknown reconcile key.
    pub fn reconciler(&self, config: &PrsyncConfig) -> Result<Reconciler, ServiceError> {
        Ok(Reconciler::new(Arc::clone(&self.store))
            .with_key(config.reconcile_key()?)
            .with_telemetry(Arc::clone(&self.telemetry)))
    }
}
