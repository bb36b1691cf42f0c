//! Application configuration loaded from CLI, environment, and files.
//!
//! [`PrsyncConfig`] merges command-line arguments, environment variables, and
//! configuration files with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.prsync.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PRSYNC_TOKEN`, `PRSYNC_OWNER`, and so on,
//!    plus the legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--token`/`-t`, `--owner`/`-o`, ...
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! owner = "octocat"
//! repo = "hello-world"
//! database_url = "prsync.sqlite"
//! reconcile_key = "number"
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::github::GatewayError;
use crate::reconcile::ReconcileKey;
use crate::resolve::GITHUB_API_BASE;

/// Operation mode determined by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Apply pending database migrations and exit.
    MigrateDatabase,
    /// Reconcile the local store with the open GitHub listing.
    Sync,
    /// Start or enrich a draft for a branch pair.
    Prepare,
    /// Create the pull request for a prepared draft.
    Promote,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use prsync::PrsyncConfig;
///
/// let config = PrsyncConfig::load().expect("failed to load configuration");
/// let (owner, repo) = config
///     .require_repository_info()
///     .expect("owner and repo required");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRSYNC",
    discovery(
        dotfile_name = ".prsync.toml",
        config_file_name = "prsync.toml",
        app_name = "prsync"
    )
)]
pub struct PrsyncConfig {
    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `PRSYNC_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Repository owner (e.g., "octocat").
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "hello-world").
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// GitHub REST API base, for GitHub Enterprise installations.
    ///
    /// Defaults to `https://api.github.com`.
    #[ortho_config()]
    pub api_url: Option<String>,

    /// Local `SQLite` database path holding pull requests and drafts.
    ///
    /// Can be provided via:
    /// - CLI: `--database-url <PATH>`
    /// - Environment: `PRSYNC_DATABASE_URL`
    /// - Config file: `database_url = "..."`
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so this is CLI or file only.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Reconciles the repository with GitHub and lists local records.
    #[ortho_config()]
    pub sync: bool,

    /// Head branch of the draft (`--source` or `-H`).
    #[ortho_config(cli_short = 'H')]
    pub source: Option<String>,

    /// Base branch of the draft (`--target` or `-B`).
    #[ortho_config(cli_short = 'B')]
    pub target: Option<String>,

    /// Draft title.
    #[ortho_config()]
    pub title: Option<String>,

    /// Draft body.
    #[ortho_config()]
    pub body: Option<String>,

    /// Draft summary.
    #[ortho_config()]
    pub summary: Option<String>,

    /// Creates the pull request for the draft of `source` into `target`.
    #[ortho_config()]
    pub promote: bool,

    /// Reconciliation match key: `number` (default) or `global-id`.
    #[ortho_config()]
    pub reconcile_key: Option<String>,
}

impl PrsyncConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingToken`] when no source provides a value.
    pub fn resolve_token(&self) -> Result<String, GatewayError> {
        self.token_or(env::var("GITHUB_TOKEN").ok())
    }

    fn token_or(&self, fallback: Option<String>) -> Result<String, GatewayError> {
        self.token
            .clone()
            .or(fallback)
            .filter(|token| !token.trim().is_empty())
            .ok_or(GatewayError::MissingToken)
    }

    /// Determines the operation mode.
    ///
    /// Flags win over branch names: `migrate_db`, then `promote`, then
    /// `sync`. Without a flag, a source or target branch selects `Prepare`
    /// and anything else falls back to `Sync`.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.migrate_db {
            OperationMode::MigrateDatabase
        } else if self.promote {
            OperationMode::Promote
        } else if self.sync {
            OperationMode::Sync
        } else if self.source.is_some() || self.target.is_some() {
            OperationMode::Prepare
        } else {
            OperationMode::Sync
        }
    }

    /// Returns owner and repo if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] when owner or repo is
    /// missing.
    pub fn require_repository_info(&self) -> Result<(&str, &str), ServiceError> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Ok((owner.as_str(), repo.as_str())),
            (None, _) => Err(ServiceError::validation(
                "repository owner is required (use --owner or -o)",
            )),
            (_, None) => Err(ServiceError::validation(
                "repository name is required (use --repo or -r)",
            )),
        }
    }

    /// Returns source and target branches if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] when either is missing.
    pub fn require_branches(&self) -> Result<(&str, &str), ServiceError> {
        match (&self.source, &self.target) {
            (Some(source), Some(target)) => Ok((source.as_str(), target.as_str())),
            (None, _) => Err(ServiceError::validation(
                "source branch is required (use --source or -H)",
            )),
            (_, None) => Err(ServiceError::validation(
                "target branch is required (use --target or -B)",
            )),
        }
    }

    /// Returns the database path.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] when none is configured.
    pub fn require_database_url(&self) -> Result<&str, ServiceError> {
        self.database_url.as_deref().ok_or_else(|| {
            ServiceError::validation("database URL is required (use --database-url)")
        })
    }

    /// GitHub API base, defaulting to the public API.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.as_deref().unwrap_or(GITHUB_API_BASE)
    }

    /// Parsed reconciliation key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ValidationFailed`] for unknown values.
    pub fn reconcile_key(&self) -> Result<ReconcileKey, ServiceError> {
        self.reconcile_key
            .as_deref()
            .map_or(Ok(ReconcileKey::default()), str::parse)
    }
}
