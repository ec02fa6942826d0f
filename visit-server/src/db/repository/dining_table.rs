//! Dining Table Repository

use super::RepoResult;
use shared::models::DiningTable;
use sqlx::SqliteExecutor;

const COLUMNS: &str = "id, number, is_open, visit_token, verification_code, updated_at";

pub async fn find_all<'e>(db: impl SqliteExecutor<'e>) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table ORDER BY number"
    ))
    .fetch_all(db)
    .await?;
    Ok(tables)
}

pub async fn find_by_id<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

pub async fn find_by_number<'e>(
    db: impl SqliteExecutor<'e>,
    number: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE number = ? LIMIT 1"
    ))
    .bind(number)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

/// Insert a closed table
pub async fn insert<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    number: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT INTO dining_table (id, number, is_open, updated_at) VALUES (?, ?, 0, ?)")
        .bind(id)
        .bind(number)
        .bind(now)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_number<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    number: i64,
    now: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query("UPDATE dining_table SET number = ?, updated_at = ? WHERE id = ?")
        .bind(number)
        .bind(now)
        .bind(id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM dining_table WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

/// Mark a table open in one statement.
///
/// An already-open table keeps its token and code; a closed one takes the
/// candidate pair. SET expressions read the pre-update row, so the CASE
/// branches see the previous state. Returns the row as persisted, or `None`
/// for an unknown id.
pub async fn open_visit<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    candidate_token: &str,
    candidate_code: &str,
    now: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "UPDATE dining_table SET \
            visit_token = CASE WHEN is_open = 1 AND visit_token IS NOT NULL THEN visit_token ELSE ?2 END, \
            verification_code = CASE WHEN is_open = 1 AND visit_token IS NOT NULL THEN verification_code ELSE ?3 END, \
            updated_at = CASE WHEN is_open = 1 AND visit_token IS NOT NULL THEN updated_at ELSE ?4 END, \
            is_open = 1 \
         WHERE id = ?1 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(candidate_token)
    .bind(candidate_code)
    .bind(now)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

/// Close a table and drop its visit secrets. Returns rows matched (0 = unknown id).
pub async fn close_visit<'e>(db: impl SqliteExecutor<'e>, id: i64, now: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE dining_table SET \
            updated_at = CASE WHEN is_open = 1 THEN ?2 ELSE updated_at END, \
            is_open = 0, visit_token = NULL, verification_code = NULL \
         WHERE id = ?1",
    )
    .bind(id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(rows.rows_affected())
}
