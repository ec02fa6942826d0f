//! Device Session Repository

use super::RepoResult;
use shared::models::DeviceSession;
use sqlx::SqliteExecutor;

/// A session joined with the live state of its table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionBinding {
    pub session_id: String,
    pub is_active: bool,
    pub session_token: String,
    pub table_id: i64,
    pub table_number: i64,
    pub table_open: bool,
    pub table_token: Option<String>,
}

pub async fn insert<'e>(db: impl SqliteExecutor<'e>, session: &DeviceSession) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO device_session (id, table_id, visit_token, is_active, created_at, last_activity_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(session.table_id)
    .bind(&session.visit_token)
    .bind(session.is_active)
    .bind(session.created_at)
    .bind(session.last_activity_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_by_table<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
) -> RepoResult<Vec<DeviceSession>> {
    let sessions = sqlx::query_as::<_, DeviceSession>(
        "SELECT id, table_id, visit_token, is_active, created_at, last_activity_at FROM device_session WHERE table_id = ? ORDER BY created_at",
    )
    .bind(table_id)
    .fetch_all(db)
    .await?;
    Ok(sessions)
}

/// Session + table snapshot read in a single statement
pub async fn find_binding<'e>(
    db: impl SqliteExecutor<'e>,
    session_id: &str,
) -> RepoResult<Option<SessionBinding>> {
    let binding = sqlx::query_as::<_, SessionBinding>(
        "SELECT s.id AS session_id, s.is_active, s.visit_token AS session_token, \
                t.id AS table_id, t.number AS table_number, t.is_open AS table_open, t.visit_token AS table_token \
         FROM device_session s JOIN dining_table t ON t.id = s.table_id \
         WHERE s.id = ?",
    )
    .bind(session_id)
    .fetch_optional(db)
    .await?;
    Ok(binding)
}

pub async fn touch<'e>(db: impl SqliteExecutor<'e>, session_id: &str, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE device_session SET last_activity_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(session_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn deactivate_for_table<'e>(db: impl SqliteExecutor<'e>, table_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("UPDATE device_session SET is_active = 0 WHERE table_id = ? AND is_active = 1")
        .bind(table_id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn deactivate_idle<'e>(db: impl SqliteExecutor<'e>, cutoff: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE device_session SET is_active = 0 WHERE is_active = 1 AND last_activity_at < ?",
    )
    .bind(cutoff)
    .execute(db)
    .await?;
    Ok(rows.rows_affected())
}
