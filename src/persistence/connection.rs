//! Connection and error-mapping helpers shared by the `SQLite` adapters.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

/// Rejects blank database URLs, returning the trimmed value.
pub(crate) fn validated_database_url(
    database_url: impl Into<String>,
) -> Result<String, PersistenceError> {
    let raw_url = database_url.into();
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }
    Ok(trimmed.to_owned())
}

/// Opens a connection with foreign key enforcement enabled.
pub(crate) fn establish_connection(
    database_url: &str,
) -> Result<SqliteConnection, PersistenceError> {
    let mut connection = SqliteConnection::establish(database_url).map_err(|error| {
        PersistenceError::ConnectionFailed {
            message: error.to_string(),
        }
    })?;

    sql_query("PRAGMA foreign_keys = ON;")
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| PersistenceError::ForeignKeysEnableFailed {
            message: error.to_string(),
        })?;

    Ok(connection)
}

/// Converts an external identifier to the signed column type.
pub(crate) fn to_sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Converts a signed column value back to an external identifier.
pub(crate) fn from_sql_integer(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Reads the rowid assigned by the most recent insert on this connection.
pub(crate) fn last_insert_rowid(
    connection: &mut SqliteConnection,
) -> Result<i64, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        id: i64,
    }

    sql_query("SELECT last_insert_rowid() AS id;")
        .get_result::<Row>(connection)
        .map(|row| row.id)
}

fn table_exists(
    connection: &mut SqliteConnection,
    table: &str,
) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let found: Option<Row> = sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1;",
    )
    .bind::<Text, _>(table)
    .get_result(connection)
    .optional()?;

    Ok(found.is_some_and(|row| row.name == table))
}

fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
    create_error: F,
) -> PersistenceError
where
    F: Fn(String) -> PersistenceError,
{
    match table_exists(connection, table) {
        Ok(false) => PersistenceError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}

/// Maps a read failure, distinguishing an unmigrated database.
pub(crate) fn map_query_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::QueryFailed { message }
    })
}

/// Maps a write failure, distinguishing an unmigrated database.
pub(crate) fn map_write_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::WriteFailed { message }
    })
}
