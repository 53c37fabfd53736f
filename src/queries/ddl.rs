use sea_query::{
    ColumnDef, ForeignKey, ForeignKeyAction, Index, PostgresQueryBuilder, Table,
};

use crate::schema::{Transcriptions, Users};

/// CREATE TABLE IF NOT EXISTS users (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL,
///     usage_count BIGINT NOT NULL DEFAULT 0,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE
/// )
pub fn create_users_table() -> String {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).uuid().primary_key())
        .col(ColumnDef::new(Users::Name).text().not_null())
        .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
        .col(
            ColumnDef::new(Users::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::UsageCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Users::IsAdmin)
                .boolean()
                .not_null()
                .default(false),
        )
        .to_string(PostgresQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS transcriptions (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     filename TEXT NOT NULL,
///     raw_transcription TEXT NOT NULL,
///     summary TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL
/// )
pub fn create_transcriptions_table() -> String {
    Table::create()
        .table(Transcriptions::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Transcriptions::Id)
                .big_integer()
                .primary_key()
                .auto_increment(), // Sea Query handles BIGSERIAL for PostgreSQL
        )
        .col(ColumnDef::new(Transcriptions::UserId).uuid().not_null())
        .col(ColumnDef::new(Transcriptions::Filename).text().not_null())
        .col(
            ColumnDef::new(Transcriptions::RawTranscription)
                .text()
                .not_null(),
        )
        .col(ColumnDef::new(Transcriptions::Summary).text().not_null())
        .col(
            ColumnDef::new(Transcriptions::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(Transcriptions::Table, Transcriptions::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(PostgresQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_transcriptions_user_id ON transcriptions(user_id, created_at)
pub fn create_transcriptions_user_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_transcriptions_user_id")
        .table(Transcriptions::Table)
        .col(Transcriptions::UserId)
        .col(Transcriptions::CreatedAt)
        .to_string(PostgresQueryBuilder)
}

/// CREATE EXTENSION IF NOT EXISTS pgcrypto
///
/// Password hashing is delegated to the database via crypt()/gen_salt(),
/// which needs the pgcrypto extension installed.
pub fn create_pgcrypto_extension() -> String {
    "CREATE EXTENSION IF NOT EXISTS pgcrypto".to_string()
}
