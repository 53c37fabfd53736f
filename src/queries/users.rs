use sea_query::{Expr, Order, PostgresQueryBuilder, Query};
use uuid::Uuid;

use crate::schema::Users;

/// SELECT id, name, email, created_at, usage_count, is_admin FROM users WHERE id = ?
pub fn select_by_id(id: Uuid) -> String {
    Query::select()
        .columns([
            Users::Id,
            Users::Name,
            Users::Email,
            Users::CreatedAt,
            Users::UsageCount,
            Users::IsAdmin,
        ])
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(PostgresQueryBuilder)
}

/// SELECT id, name, email, created_at, usage_count, is_admin FROM users ORDER BY created_at
pub fn select_all() -> String {
    Query::select()
        .columns([
            Users::Id,
            Users::Name,
            Users::Email,
            Users::CreatedAt,
            Users::UsageCount,
            Users::IsAdmin,
        ])
        .from(Users::Table)
        .order_by(Users::CreatedAt, Order::Asc)
        .to_string(PostgresQueryBuilder)
}

/// SELECT is_admin FROM users WHERE id = ?
pub fn select_is_admin(id: Uuid) -> String {
    Query::select()
        .column(Users::IsAdmin)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(PostgresQueryBuilder)
}

/// UPDATE users SET name = ? WHERE id = ?
pub fn update_name(id: Uuid, name: &str) -> String {
    Query::update()
        .table(Users::Table)
        .value(Users::Name, name)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(PostgresQueryBuilder)
}

/// UPDATE users SET is_admin = ? WHERE id = ?
pub fn update_is_admin(id: Uuid, is_admin: bool) -> String {
    Query::update()
        .table(Users::Table)
        .value(Users::IsAdmin, is_admin)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(PostgresQueryBuilder)
}
