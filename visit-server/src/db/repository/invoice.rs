//! Invoice Repository

use super::RepoResult;
use shared::models::Invoice;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    table_id: i64,
    total: f64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT INTO invoice (id, table_id, total, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(table_id)
        .bind(total)
        .bind(now)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(
        "SELECT id, table_id, total, created_at FROM invoice WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(invoice)
}

/// Latest invoices of a table (re-print history)
pub async fn find_recent_by_table<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
    limit: i64,
) -> RepoResult<Vec<Invoice>> {
    let invoices = sqlx::query_as::<_, Invoice>(
        "SELECT id, table_id, total, created_at FROM invoice WHERE table_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(table_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(invoices)
}
