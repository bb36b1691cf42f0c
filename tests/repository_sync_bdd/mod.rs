//! Support modules for the repository sync BDD tests.

pub(crate) mod state;

pub(crate) use state::{SyncState, ensure_harness, local_records, run_sync, with_service};
