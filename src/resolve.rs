//! Maps local repository ids to GitHub locators.

use crate::error::ServiceError;
use crate::github::RepositoryLocator;
use crate::persistence::{PullRequestStore, RepositoryRecord};

/// Public GitHub REST API base.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Resolves repository ids against a fixed API base.
#[derive(Debug, Clone)]
pub struct RepositoryResolver {
    api_base: String,
}

impl Default for RepositoryResolver {
    fn default() -> Self {
        Self::new(GITHUB_API_BASE)
    }
}

impl RepositoryResolver {
    /// Creates a resolver for `api_base` (e.g. `https://ghe.example.com/api/v3`).
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    /// Loads the repository and builds its locator.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown ids,
    /// [`ServiceError::ValidationFailed`] when the stored name is not
    /// `owner/name`, and [`ServiceError::PersistenceFailure`] when the lookup
    /// fails.
    pub fn locate(
        &self,
        store: &dyn PullRequestStore,
        repository_id: i64,
    ) -> Result<(RepositoryRecord, RepositoryLocator), ServiceError> {
        let repository = store.find_repository(repository_id)?.ok_or_else(|| {
            ServiceError::not_found(format!("repository {repository_id} not found"))
        })?;
        let locator = RepositoryLocator::from_full_name(&self.api_base, &repository.full_name)?;
        Ok((repository, locator))
    }
}
