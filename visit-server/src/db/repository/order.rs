//! Order Repository

use super::{RepoError, RepoResult};
use shared::models::{OrderLine, OrderState, PendingCount};
use sqlx::{SqliteConnection, SqliteExecutor};

const ORDER_COLUMNS: &str =
    "id, table_id, customer_user_id, visit_code, state, invoice_id, created_at";

/// Order header as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub table_id: i64,
    pub customer_user_id: Option<i64>,
    pub visit_code: Option<String>,
    pub state: String,
    pub invoice_id: Option<i64>,
    pub created_at: i64,
}

impl OrderRow {
    pub fn state(&self) -> RepoResult<OrderState> {
        self.state
            .parse()
            .map_err(|e: String| RepoError::Database(format!("order {}: {e}", self.id)))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineRow {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_snapshot: f64,
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price_snapshot: row.unit_price_snapshot,
        }
    }
}

/// Insert a pending order only if its table is open at this instant.
///
/// Without an explicit `visit_code` the order takes the table's live
/// verification code. Returns rows inserted: 0 means the table is missing
/// or closed.
pub async fn insert_if_table_open<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    table_id: i64,
    customer_user_id: Option<i64>,
    visit_code: Option<&str>,
    now: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "INSERT INTO table_order (id, table_id, customer_user_id, visit_code, state, created_at) \
         SELECT ?, id, ?, COALESCE(?, verification_code), 'PENDING', ? FROM dining_table WHERE id = ? AND is_open = 1",
    )
    .bind(id)
    .bind(customer_user_id)
    .bind(visit_code)
    .bind(now)
    .bind(table_id)
    .execute(db)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[OrderLine],
) -> RepoResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_line (order_id, position, product_id, quantity, unit_price_snapshot) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(position as i64)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_snapshot)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn delete_lines<'e>(db: impl SqliteExecutor<'e>, order_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM order_line WHERE order_id = ?")
        .bind(order_id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<OrderRow>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM table_order WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_lines<'e>(db: impl SqliteExecutor<'e>, order_id: i64) -> RepoResult<Vec<LineRow>> {
    let lines = sqlx::query_as::<_, LineRow>(
        "SELECT order_id, product_id, quantity, unit_price_snapshot FROM order_line WHERE order_id = ? ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(lines)
}

/// Orders of one visit, newest first
pub async fn find_by_visit<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
    visit_code: &str,
) -> RepoResult<Vec<OrderRow>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM table_order WHERE table_id = ? AND visit_code = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(table_id)
    .bind(visit_code)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Lines of every order of one visit, grouped by order and in line order
pub async fn find_lines_by_visit<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
    visit_code: &str,
) -> RepoResult<Vec<LineRow>> {
    let lines = sqlx::query_as::<_, LineRow>(
        "SELECT l.order_id, l.product_id, l.quantity, l.unit_price_snapshot \
         FROM order_line l JOIN table_order o ON o.id = l.order_id \
         WHERE o.table_id = ? AND o.visit_code = ? \
         ORDER BY l.order_id, l.position",
    )
    .bind(table_id)
    .bind(visit_code)
    .fetch_all(db)
    .await?;
    Ok(lines)
}

/// Confirmed orders of a table that no invoice covers yet, oldest first
pub async fn find_uninvoiced_confirmed<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
) -> RepoResult<Vec<OrderRow>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM table_order \
         WHERE table_id = ? AND state = 'CONFIRMED' AND invoice_id IS NULL \
         ORDER BY created_at, id"
    ))
    .bind(table_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_ids_by_invoice<'e>(
    db: impl SqliteExecutor<'e>,
    invoice_id: i64,
) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM table_order WHERE invoice_id = ? ORDER BY created_at, id",
    )
    .bind(invoice_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}

/// Move a pending order to `target`. Returns rows changed (0 = not pending anymore).
pub async fn update_state_if_pending<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    target: OrderState,
) -> RepoResult<u64> {
    let rows = sqlx::query("UPDATE table_order SET state = ? WHERE id = ? AND state = 'PENDING'")
        .bind(target.as_str())
        .bind(id)
        .execute(db)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn attach_invoice<'e>(
    db: impl SqliteExecutor<'e>,
    order_id: i64,
    invoice_id: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE table_order SET invoice_id = ? WHERE id = ? AND invoice_id IS NULL",
    )
    .bind(invoice_id)
    .bind(order_id)
    .execute(db)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn count_by_state<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
    state: OrderState,
) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM table_order WHERE table_id = ? AND state = ?",
    )
    .bind(table_id)
    .bind(state.as_str())
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn count_for_table<'e>(db: impl SqliteExecutor<'e>, table_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM table_order WHERE table_id = ?")
        .bind(table_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn pending_counts<'e>(db: impl SqliteExecutor<'e>) -> RepoResult<Vec<PendingCount>> {
    let counts = sqlx::query_as::<_, PendingCount>(
        "SELECT t.id AS table_id, t.number AS table_number, COUNT(o.id) AS pending \
         FROM table_order o JOIN dining_table t ON t.id = o.table_id \
         WHERE o.state = 'PENDING' \
         GROUP BY t.id, t.number \
         ORDER BY t.number",
    )
    .fetch_all(db)
    .await?;
    Ok(counts)
}
