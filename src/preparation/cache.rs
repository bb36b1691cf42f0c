//! Draft storage on top of a [`CacheBackend`].
//!
//! Drafts are stored as JSON under
//! `pr:prepare:{repository_id}:{source}:{target}` with branch names sanitised
//! and a fixed six hour expiry from the last write. Reads never extend the
//! expiry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheError};
use super::draft::{DraftKey, PreparationDraft};

/// Namespace prefix for every draft key.
pub const CACHE_NAMESPACE: &str = "pr:prepare";

/// Lifetime of a draft after its last write.
pub const DRAFT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Literal used in keys when a branch name is absent.
const ABSENT_BRANCH: &str = "null";

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
///
/// An absent name becomes `"null"`. Applying the function to its own output
/// changes nothing.
///
/// # Examples
///
/// ```
/// use prsync::preparation::sanitize_branch_name;
///
/// assert_eq!(sanitize_branch_name(Some("feature/login form")), "feature_login_form");
/// assert_eq!(sanitize_branch_name(None), "null");
/// ```
#[must_use]
pub fn sanitize_branch_name(branch: Option<&str>) -> String {
    branch.map_or_else(
        || ABSENT_BRANCH.to_owned(),
        |name| {
            name.chars()
                .map(|character| {
                    if character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-') {
                        character
                    } else {
                        '_'
                    }
                })
                .collect()
        },
    )
}

/// Builds the backend key for a draft.
#[must_use]
pub fn draft_cache_key(key: &DraftKey) -> String {
    format!(
        "{CACHE_NAMESPACE}:{}:{}:{}",
        key.repository_id(),
        sanitize_branch_name(Some(key.source())),
        sanitize_branch_name(Some(key.target())),
    )
}

/// TTL-bounded draft store.
#[derive(Clone)]
pub struct PreparationCache {
    backend: Arc<dyn CacheBackend>,
}

impl PreparationCache {
    /// Wraps a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Stores a draft, replacing any previous one and restarting its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the draft cannot be serialised or written.
    pub fn put(&self, draft: &PreparationDraft) -> Result<(), CacheError> {
        let key = draft_cache_key(draft.key());
        let payload = serde_json::to_string(draft).map_err(|error| CacheError::Serialisation {
            message: error.to_string(),
        })?;
        self.backend.set_with_expiry(&key, &payload, DRAFT_TTL)?;
        debug!(%key, "stored preparation draft");
        Ok(())
    }

    /// Reads a live draft.
    ///
    /// Backend failures and undecodable payloads are logged and treated as a
    /// miss.
    #[must_use]
    pub fn get(&self, key: &DraftKey) -> Option<PreparationDraft> {
        let cache_key = draft_cache_key(key);
        let payload = match self.backend.get(&cache_key) {
            Ok(payload) => payload?,
            Err(error) => {
                warn!(key = %cache_key, %error, "draft cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(draft) => Some(draft),
            Err(error) => {
                warn!(key = %cache_key, %error, "discarding undecodable draft payload");
                None
            }
        }
    }

    /// Removes a draft. Removing an absent draft succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the backend delete fails.
    pub fn delete(&self, key: &DraftKey) -> Result<(), CacheError> {
        self.backend.delete(&draft_cache_key(key))
    }
}
