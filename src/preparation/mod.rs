//! Pull request preparation.
//!
//! A preparation is a draft pull request cached per `(repository, source,
//! target)` while its metadata is collected. [`PreparationWorkflow`] starts
//! drafts from a GitHub comparison, applies partial enrichments, and promotes
//! a draft into a real pull request recorded in the local store.

pub mod backend;
mod cache;
mod draft;
mod workflow;

pub use backend::{
    CacheBackend, CacheError, Clock, InMemoryCacheBackend, SqliteCacheBackend, SystemClock,
};
pub use cache::{CACHE_NAMESPACE, DRAFT_TTL, PreparationCache, draft_cache_key, sanitize_branch_name};
pub use draft::{ComparisonSummary, DraftKey, PreparationDraft, UserInfo};
pub use workflow::{EnrichRequest, PreparationWorkflow, PromoteRequest, is_creatable};
