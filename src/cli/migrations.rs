//! Database migration operations.

use prsync::persistence::{PersistenceError, migrate_database};
use prsync::telemetry::StderrJsonlTelemetrySink;
use prsync::{PrsyncConfig, ServiceError};
use tracing::info;

/// Runs database migrations.
///
/// # Errors
///
/// Returns [`ServiceError::ValidationFailed`] if the database URL is missing
/// or blank, and [`ServiceError::PersistenceFailure`] for connection or
/// migration failures.
pub fn run(config: &PrsyncConfig) -> Result<(), ServiceError> {
    let database_url = config.database_url.as_deref().ok_or_else(|| {
        ServiceError::validation(PersistenceError::MissingDatabaseUrl.to_string())
    })?;

    let telemetry = StderrJsonlTelemetrySink;
    let version = migrate_database(database_url, &telemetry)
        .map_err(|error| map_persistence_error(&error))?;
    info!(schema_version = version.as_str(), "database migrated");
    Ok(())
}

/// Maps a persistence error to a service error.
///
/// A blank URL is a configuration problem; everything else is a runtime
/// persistence failure.
fn map_persistence_error(error: &PersistenceError) -> ServiceError {
    if is_configuration_error(error) {
        ServiceError::validation(error.to_string())
    } else {
        ServiceError::PersistenceFailure {
            message: error.to_string(),
        }
    }
}

/// Returns true if the persistence error is a configuration problem.
const fn is_configuration_error(error: &PersistenceError) -> bool {
    matches!(error, PersistenceError::BlankDatabaseUrl)
}
