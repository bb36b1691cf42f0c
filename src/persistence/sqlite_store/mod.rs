//! `SQLite` implementation of [`PullRequestStore`].
//!
//! Each call opens its own connection with foreign keys enabled, so the store
//! is cheap to clone and safe to share between tasks. Multi-row writes run in
//! a single transaction.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::result::QueryResult;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;
use super::connection::{
    establish_connection, from_sql_integer, last_insert_rowid, map_query_error, map_write_error,
    to_sql_integer, validated_database_url,
};
use super::models::{
    DEFAULT_USER_GRADE, DescriptionEntry, NewPullRequest, NewUser, PriorityEntry,
    PromotedPullRequest, PullRequestChildren, PullRequestFields, PullRequestId,
    PullRequestRecord, RepositoryRecord, UserRecord,
};
use super::store::PullRequestStore;


const PULL_REQUESTS_TABLE: &str = "pull_requests";
const REPOSITORIES_TABLE: &str = "repositories";
const USERS_TABLE: &str = "users";

const PULL_REQUEST_COLUMNS: &str = "id, repository_id, author_id, github_id, github_pr_number, \
     title, body, state, base_branch, head_branch, summary, html_url";

const USER_COLUMNS: &str = "users.id AS id, users.github_id AS github_id, \
     users.github_username AS github_username, users.github_email AS github_email, \
     users.avatar_url AS avatar_url, users.user_type AS user_type, \
     users.reward_points AS reward_points, users.user_grade AS user_grade";

#[derive(Debug, QueryableByName)]
struct PullRequestRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = BigInt)]
    repository_id: i64,
    #[diesel(sql_type = BigInt)]
    author_id: i64,
    #[diesel(sql_type = BigInt)]
    github_id: i64,
    #[diesel(sql_type = BigInt)]
    github_pr_number: i64,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Nullable<Text>)]
    body: Option<String>,
    #[diesel(sql_type = Text)]
    state: String,
    #[diesel(sql_type = Text)]
    base_branch: String,
    #[diesel(sql_type = Text)]
    head_branch: String,
    #[diesel(sql_type = Nullable<Text>)]
    summary: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    html_url: Option<String>,
}

impl From<PullRequestRow> for PullRequestRecord {
    fn from(row: PullRequestRow) -> Self {
        Self {
            id: PullRequestId::new(row.id),
            fields: PullRequestFields {
                repository_id: row.repository_id,
                author_id: row.author_id,
                github_id: from_sql_integer(row.github_id),
                github_pr_number: from_sql_integer(row.github_pr_number),
                title: row.title,
                body: row.body,
                state: row.state,
                base_branch: row.base_branch,
                head_branch: row.head_branch,
                summary: row.summary,
                html_url: row.html_url,
            },
        }
    }
}

#[derive(Debug, QueryableByName)]
struct UserRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = BigInt)]
    github_id: i64,
    #[diesel(sql_type = Text)]
    github_username: String,
    #[diesel(sql_type = Nullable<Text>)]
    github_email: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    avatar_url: Option<String>,
    #[diesel(sql_type = Text)]
    user_type: String,
    #[diesel(sql_type = BigInt)]
    reward_points: i64,
    #[diesel(sql_type = Text)]
    user_grade: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            github_id: from_sql_integer(row.github_id),
            github_username: row.github_username,
            github_email: row.github_email,
            avatar_url: row.avatar_url,
            user_type: row.user_type,
            reward_points: row.reward_points,
            user_grade: row.user_grade,
        }
    }
}

#[derive(Debug, QueryableByName)]
struct RepositoryRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    full_name: String,
}

#[derive(Debug, QueryableByName)]
struct PriorityRow {
    #[diesel(sql_type = Integer)]
    idx: i32,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    content: String,
}

#[derive(Debug, QueryableByName)]
struct DescriptionRow {
    #[diesel(sql_type = Text)]
    path: String,
    #[diesel(sql_type = Integer)]
    position: i32,
    #[diesel(sql_type = Text)]
    record_key: String,
}

/// SQLite-backed pull request store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database_url: String,
}

impl SqliteStore {
    /// Creates a store targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: validated_database_url(database_url)?,
        })
    }

    /// Returns the database URL this store connects to.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn connect(&self) -> Result<SqliteConnection, PersistenceError> {
        establish_connection(&self.database_url)
    }

    fn query_pull_requests(
        &self,
        filter: &str,
        value: i64,
    ) -> Result<Vec<PullRequestRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        sql_query(format!(
            "SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests WHERE {filter}"
        ))
        .bind::<BigInt, _>(value)
        .load::<PullRequestRow>(&mut connection)
        .map(|rows| rows.into_iter().map(PullRequestRecord::from).collect())
        .map_err(|error| map_query_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }
}

fn insert_pull_request(
    connection: &mut SqliteConnection,
    pull_request: &NewPullRequest,
) -> QueryResult<PullRequestId> {
    let fields = &pull_request.fields;
    sql_query(
        "INSERT INTO pull_requests \
         (repository_id, author_id, github_id, github_pr_number, title, body, state, \
          base_branch, head_branch, summary, html_url) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);",
    )
    .bind::<BigInt, _>(fields.repository_id)
    .bind::<BigInt, _>(fields.author_id)
    .bind::<BigInt, _>(to_sql_integer(fields.github_id))
    .bind::<BigInt, _>(to_sql_integer(fields.github_pr_number))
    .bind::<Text, _>(&fields.title)
    .bind::<Nullable<Text>, _>(fields.body.as_deref())
    .bind::<Text, _>(&fields.state)
    .bind::<Text, _>(&fields.base_branch)
    .bind::<Text, _>(&fields.head_branch)
    .bind::<Nullable<Text>, _>(fields.summary.as_deref())
    .bind::<Nullable<Text>, _>(fields.html_url.as_deref())
    .execute(connection)?;

    let id = PullRequestId::new(last_insert_rowid(connection)?);

    for reviewer_id in &pull_request.reviewer_ids {
        sql_query("INSERT OR IGNORE INTO reviewers (pull_request_id, user_id) VALUES (?, ?);")
            .bind::<BigInt, _>(id.get())
            .bind::<BigInt, _>(*reviewer_id)
            .execute(connection)?;
    }

    Ok(id)
}

fn update_pull_request(
    connection: &mut SqliteConnection,
    record: &PullRequestRecord,
) -> QueryResult<usize> {
    let fields = &record.fields;
    sql_query(
        "UPDATE pull_requests SET \
           author_id = ?, github_id = ?, github_pr_number = ?, title = ?, body = ?, \
           state = ?, base_branch = ?, head_branch = ?, summary = ?, html_url = ?, \
           updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?;",
    )
    .bind::<BigInt, _>(fields.author_id)
    .bind::<BigInt, _>(to_sql_integer(fields.github_id))
    .bind::<BigInt, _>(to_sql_integer(fields.github_pr_number))
    .bind::<Text, _>(&fields.title)
    .bind::<Nullable<Text>, _>(fields.body.as_deref())
    .bind::<Text, _>(&fields.state)
    .bind::<Text, _>(&fields.base_branch)
    .bind::<Text, _>(&fields.head_branch)
    .bind::<Nullable<Text>, _>(fields.summary.as_deref())
    .bind::<Nullable<Text>, _>(fields.html_url.as_deref())
    .bind::<BigInt, _>(record.id.get())
    .execute(connection)
}

fn find_pull_request(
    connection: &mut SqliteConnection,
    id: PullRequestId,
) -> QueryResult<Option<PullRequestRecord>> {
    sql_query(format!(
        "SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests WHERE id = ? LIMIT 1;"
    ))
    .bind::<BigInt, _>(id.get())
    .get_result::<PullRequestRow>(connection)
    .optional()
    .map(|row| row.map(PullRequestRecord::from))
}

fn save_promoted_rows(
    connection: &mut SqliteConnection,
    promoted: &PromotedPullRequest,
) -> QueryResult<PullRequestRecord> {
    let id = insert_pull_request(connection, &promoted.pull_request)?;

    for priority in &promoted.priorities {
        sql_query(
            "INSERT INTO priorities (pull_request_id, idx, title, content) VALUES (?, ?, ?, ?);",
        )
        .bind::<BigInt, _>(id.get())
        .bind::<Integer, _>(priority.idx)
        .bind::<Text, _>(&priority.title)
        .bind::<Text, _>(&priority.content)
        .execute(connection)?;
    }

    for description in &promoted.descriptions {
        sql_query(
            "INSERT INTO descriptions (pull_request_id, path, position, record_key) \
             VALUES (?, ?, ?, ?);",
        )
        .bind::<BigInt, _>(id.get())
        .bind::<Text, _>(&description.path)
        .bind::<Integer, _>(description.position)
        .bind::<Text, _>(&description.record_key)
        .execute(connection)?;
    }

    find_pull_request(connection, id)?.ok_or(diesel::result::Error::NotFound)
}

fn load_children_rows(
    connection: &mut SqliteConnection,
    id: PullRequestId,
) -> QueryResult<PullRequestChildren> {
    let reviewers = sql_query(format!(
        "SELECT {USER_COLUMNS} FROM reviewers \
         JOIN users ON users.id = reviewers.user_id \
         WHERE reviewers.pull_request_id = ? ORDER BY reviewers.id;"
    ))
    .bind::<BigInt, _>(id.get())
    .load::<UserRow>(connection)?;

    let priorities = sql_query(
        "SELECT idx, title, content FROM priorities WHERE pull_request_id = ? ORDER BY idx, id;",
    )
    .bind::<BigInt, _>(id.get())
    .load::<PriorityRow>(connection)?;

    let descriptions = sql_query(
        "SELECT path, position, record_key FROM descriptions \
         WHERE pull_request_id = ? ORDER BY id;",
    )
    .bind::<BigInt, _>(id.get())
    .load::<DescriptionRow>(connection)?;

    Ok(PullRequestChildren {
        reviewers: reviewers.into_iter().map(UserRecord::from).collect(),
        priorities: priorities
            .into_iter()
            .map(|row| PriorityEntry {
                idx: row.idx,
                title: row.title,
                content: row.content,
            })
            .collect(),
        descriptions: descriptions
            .into_iter()
            .map(|row| DescriptionEntry {
                path: row.path,
                position: row.position,
                record_key: row.record_key,
            })
            .collect(),
    })
}

fn find_user_by_github_id(
    connection: &mut SqliteConnection,
    github_id: u64,
) -> QueryResult<Option<UserRecord>> {
    sql_query(format!(
        "SELECT {USER_COLUMNS} FROM users WHERE users.github_id = ? LIMIT 1;"
    ))
    .bind::<BigInt, _>(to_sql_integer(github_id))
    .get_result::<UserRow>(connection)
    .optional()
    .map(|row| row.map(UserRecord::from))
}

impl PullRequestStore for SqliteStore {
    fn list_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<PullRequestRecord>, PersistenceError> {
        self.query_pull_requests("repository_id = ? ORDER BY github_pr_number;", repository_id)
    }

    fn list_by_author(&self, author_id: i64) -> Result<Vec<PullRequestRecord>, PersistenceError> {
        self.query_pull_requests("author_id = ? ORDER BY id;", author_id)
    }

    fn find_by_id(
        &self,
        id: PullRequestId,
    ) -> Result<Option<PullRequestRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        find_pull_request(&mut connection, id)
            .map_err(|error| map_query_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn find_by_branches(
        &self,
        repository_id: i64,
        base: &str,
        head: &str,
    ) -> Result<Option<PullRequestRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        sql_query(format!(
            "SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests \
             WHERE repository_id = ? AND base_branch = ? AND head_branch = ? \
             ORDER BY id LIMIT 1;"
        ))
        .bind::<BigInt, _>(repository_id)
        .bind::<Text, _>(base)
        .bind::<Text, _>(head)
        .get_result::<PullRequestRow>(&mut connection)
        .optional()
        .map(|row| row.map(PullRequestRecord::from))
        .map_err(|error| map_query_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn load_children(&self, id: PullRequestId) -> Result<PullRequestChildren, PersistenceError> {
        let mut connection = self.connect()?;
        load_children_rows(&mut connection, id)
            .map_err(|error| map_query_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn find_repository(
        &self,
        repository_id: i64,
    ) -> Result<Option<RepositoryRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        sql_query("SELECT id, full_name FROM repositories WHERE id = ? LIMIT 1;")
            .bind::<BigInt, _>(repository_id)
            .get_result::<RepositoryRow>(&mut connection)
            .optional()
            .map(|row| {
                row.map(|found| RepositoryRecord {
                    id: found.id,
                    full_name: found.full_name,
                })
            })
            .map_err(|error| map_query_error(&mut connection, REPOSITORIES_TABLE, &error))
    }

    fn find_or_create_repository(
        &self,
        full_name: &str,
    ) -> Result<RepositoryRecord, PersistenceError> {
        let mut connection = self.connect()?;

        sql_query(
            "INSERT INTO repositories (full_name) VALUES (?) \
             ON CONFLICT(full_name) DO NOTHING;",
        )
        .bind::<Text, _>(full_name)
        .execute(&mut connection)
        .map_err(|error| map_write_error(&mut connection, REPOSITORIES_TABLE, &error))?;

        sql_query("SELECT id, full_name FROM repositories WHERE full_name = ? LIMIT 1;")
            .bind::<Text, _>(full_name)
            .get_result::<RepositoryRow>(&mut connection)
            .map(|row| RepositoryRecord {
                id: row.id,
                full_name: row.full_name,
            })
            .map_err(|error| map_query_error(&mut connection, REPOSITORIES_TABLE, &error))
    }

    fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        sql_query(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE users.id = ? LIMIT 1;"
        ))
        .bind::<BigInt, _>(user_id)
        .get_result::<UserRow>(&mut connection)
        .optional()
        .map(|row| row.map(UserRecord::from))
        .map_err(|error| map_query_error(&mut connection, USERS_TABLE, &error))
    }

    fn find_or_register_user(&self, user: &NewUser) -> Result<UserRecord, PersistenceError> {
        let mut connection = self.connect()?;

        sql_query(
            "INSERT INTO users \
             (github_id, github_username, github_email, avatar_url, user_type, \
              reward_points, user_grade) \
             VALUES (?, ?, ?, ?, ?, 0, ?) \
             ON CONFLICT(github_id) DO NOTHING;",
        )
        .bind::<BigInt, _>(to_sql_integer(user.github_id))
        .bind::<Text, _>(&user.github_username)
        .bind::<Nullable<Text>, _>(user.github_email.as_deref())
        .bind::<Nullable<Text>, _>(user.avatar_url.as_deref())
        .bind::<Text, _>(&user.user_type)
        .bind::<Text, _>(DEFAULT_USER_GRADE)
        .execute(&mut connection)
        .map_err(|error| map_write_error(&mut connection, USERS_TABLE, &error))?;

        find_user_by_github_id(&mut connection, user.github_id)
            .map_err(|error| map_query_error(&mut connection, USERS_TABLE, &error))?
            .ok_or_else(|| PersistenceError::QueryFailed {
                message: format!("user {} missing after registration", user.github_id),
            })
    }

    fn save_all(
        &self,
        creates: &[NewPullRequest],
        updates: &[PullRequestRecord],
    ) -> Result<(), PersistenceError> {
        if creates.is_empty() && updates.is_empty() {
            return Ok(());
        }

        let mut connection = self.connect()?;
        connection
            .transaction::<_, diesel::result::Error, _>(|transaction| {
                for record in updates {
                    update_pull_request(transaction, record)?;
                }
                for pull_request in creates {
                    insert_pull_request(transaction, pull_request)?;
                }
                Ok(())
            })
            .map_err(|error| map_write_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn delete_all(&self, ids: &[PullRequestId]) -> Result<usize, PersistenceError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut connection = self.connect()?;
        connection
            .transaction::<_, diesel::result::Error, _>(|transaction| {
                let mut removed = 0;
                for id in ids {
                    removed += sql_query("DELETE FROM pull_requests WHERE id = ?;")
                        .bind::<BigInt, _>(id.get())
                        .execute(transaction)?;
                }
                Ok(removed)
            })
            .map_err(|error| map_write_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn save_promoted(
        &self,
        promoted: &PromotedPullRequest,
    ) -> Result<PullRequestRecord, PersistenceError> {
        let mut connection = self.connect()?;
        connection
            .transaction::<_, diesel::result::Error, _>(|transaction| {
                save_promoted_rows(transaction, promoted)
            })
            .map_err(|error| map_write_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }
}
