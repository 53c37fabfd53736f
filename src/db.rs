//! PostgreSQL persistence layer
//!
//! All statements are either built with sea-query (see the `queries` module)
//! or use bound parameters directly where the database does the work, such as
//! password hashing through pgcrypto's crypt().

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::queries::{ddl, transcriptions, users};

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// A user account row, minus the password hash which never leaves the database
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub usage_count: i64,
    pub is_admin: bool,
}

/// A saved transcription row
#[derive(Debug, Clone)]
pub struct TranscriptionRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub filename: String,
    pub raw_transcription: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Build a full PostgreSQL connection URL with password and database
///
/// Takes a base URL like `postgres://user@host:5432` and inserts the password
/// and appends the database name.
pub fn build_postgres_url(
    base_url: &str,
    password: &str,
    database: &str,
) -> Result<String, DynError> {
    let url = url::Url::parse(base_url)?;

    let user = url.username();
    let host = url.host_str().ok_or("Missing host in postgres base_url")?;
    let port = url.port().unwrap_or(5432);

    let full_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user,
        urlencoding::encode(password),
        host,
        port,
        database
    );

    Ok(full_url)
}

/// Open a PostgreSQL connection pool
pub async fn open_pool(
    base_url: &str,
    password: &str,
    database: &str,
) -> Result<PgPool, DynError> {
    let full_url = build_postgres_url(base_url, password, database)?;

    let options = PgConnectOptions::from_str(&full_url)?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// One-time startup probe of the persistence collaborator.
/// Success means the app runs with authentication and history saving enabled.
pub async fn probe(pool: &PgPool) -> Result<(), DynError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Initialize the database schema: pgcrypto extension, tables, indexes
pub async fn init_schema(pool: &PgPool) -> Result<(), DynError> {
    sqlx::query(&ddl::create_pgcrypto_extension())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_users_table()).execute(pool).await?;
    sqlx::query(&ddl::create_transcriptions_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_transcriptions_user_index())
        .execute(pool)
        .await?;
    Ok(())
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        usage_count: row.get("usage_count"),
        is_admin: row.get("is_admin"),
    }
}

fn transcription_from_row(row: &sqlx::postgres::PgRow) -> TranscriptionRecord {
    TranscriptionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        filename: row.get("filename"),
        raw_transcription: row.get("raw_transcription"),
        summary: row.get("summary"),
        created_at: row.get("created_at"),
    }
}

/// Create a new user account. The password is hashed inside the database with
/// crypt()/gen_salt('bf'); the plaintext is never stored.
pub async fn register_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Uuid, DynError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, created_at, usage_count, is_admin) \
         VALUES ($1, $2, $3, crypt($4, gen_salt('bf')), $5, 0, FALSE)",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(id)
}

/// Verify email/password against the stored hash. Returns the user row on
/// success, None when the email is unknown or the password does not match.
pub async fn authenticate_user(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<UserRecord>, DynError> {
    let row = sqlx::query(
        "SELECT id, name, email, created_at, usage_count, is_admin FROM users \
         WHERE email = $1 AND password_hash = crypt($2, password_hash)",
    )
    .bind(email)
    .bind(password)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| user_from_row(&r)))
}

/// Fetch a single user by id
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>, DynError> {
    let sql = users::select_by_id(id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.map(|r| user_from_row(&r)))
}

/// List all users (admin panel)
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRecord>, DynError> {
    let sql = users::select_all();
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(user_from_row).collect())
}

/// Update a user's display name
pub async fn update_user_name(pool: &PgPool, id: Uuid, name: &str) -> Result<(), DynError> {
    let sql = users::update_name(id, name);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Fetch a user's current admin flag
pub async fn get_admin_status(pool: &PgPool, id: Uuid) -> Result<Option<bool>, DynError> {
    let sql = users::select_is_admin(id);
    let result: Option<bool> = sqlx::query_scalar(&sql).fetch_optional(pool).await?;
    Ok(result)
}

/// Set a user's admin flag
pub async fn set_admin_status(pool: &PgPool, id: Uuid, is_admin: bool) -> Result<(), DynError> {
    let sql = users::update_is_admin(id, is_admin);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Increment a user's usage counter, returning the new value
pub async fn increment_usage_count(pool: &PgPool, id: Uuid) -> Result<i64, DynError> {
    let new_count: i64 = sqlx::query_scalar(
        "UPDATE users SET usage_count = usage_count + 1 WHERE id = $1 RETURNING usage_count",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(new_count)
}

/// Save a completed transcription, returning its id
pub async fn insert_transcription(
    pool: &PgPool,
    user_id: Uuid,
    filename: &str,
    raw_transcription: &str,
    summary: &str,
) -> Result<i64, DynError> {
    let sql = transcriptions::insert(user_id, filename, raw_transcription, summary, Utc::now());
    let id: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(id)
}

/// List a user's saved transcriptions, newest first
pub async fn list_transcriptions(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<TranscriptionRecord>, DynError> {
    let sql = transcriptions::select_for_user(user_id);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(transcription_from_row).collect())
}

/// Fetch a transcription only if it belongs to the given user
pub async fn get_transcription_for_user(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<TranscriptionRecord>, DynError> {
    let sql = transcriptions::select_by_id_for_user(id, user_id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.map(|r| transcription_from_row(&r)))
}
