use chrono::{DateTime, Utc};
use sea_query::{Expr, Order, PostgresQueryBuilder, Query};
use uuid::Uuid;

use crate::schema::Transcriptions;

/// INSERT INTO transcriptions (user_id, filename, raw_transcription, summary, created_at)
/// VALUES (?, ?, ?, ?, ?) RETURNING id
pub fn insert(
    user_id: Uuid,
    filename: &str,
    raw_transcription: &str,
    summary: &str,
    created_at: DateTime<Utc>,
) -> String {
    Query::insert()
        .into_table(Transcriptions::Table)
        .columns([
            Transcriptions::UserId,
            Transcriptions::Filename,
            Transcriptions::RawTranscription,
            Transcriptions::Summary,
            Transcriptions::CreatedAt,
        ])
        .values_panic([
            user_id.into(),
            filename.into(),
            raw_transcription.into(),
            summary.into(),
            created_at.into(),
        ])
        .returning_col(Transcriptions::Id)
        .to_string(PostgresQueryBuilder)
}

/// SELECT * FROM transcriptions WHERE user_id = ? ORDER BY created_at DESC
pub fn select_for_user(user_id: Uuid) -> String {
    Query::select()
        .columns([
            Transcriptions::Id,
            Transcriptions::UserId,
            Transcriptions::Filename,
            Transcriptions::RawTranscription,
            Transcriptions::Summary,
            Transcriptions::CreatedAt,
        ])
        .from(Transcriptions::Table)
        .and_where(Expr::col(Transcriptions::UserId).eq(user_id))
        .order_by(Transcriptions::CreatedAt, Order::Desc)
        .to_string(PostgresQueryBuilder)
}

/// SELECT * FROM transcriptions WHERE id = ? AND user_id = ?
///
/// The user_id filter is the ownership check: a row owned by someone else is
/// indistinguishable from a missing row.
pub fn select_by_id_for_user(id: i64, user_id: Uuid) -> String {
    Query::select()
        .columns([
            Transcriptions::Id,
            Transcriptions::UserId,
            Transcriptions::Filename,
            Transcriptions::RawTranscription,
            Transcriptions::Summary,
            Transcriptions::CreatedAt,
        ])
        .from(Transcriptions::Table)
        .and_where(Expr::col(Transcriptions::Id).eq(id))
        .and_where(Expr::col(Transcriptions::UserId).eq(user_id))
        .to_string(PostgresQueryBuilder)
}
