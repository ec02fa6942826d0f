//! OrderLedger - 点单与状态机
//!
//! `Pending -> {Confirmed, Rejected}`. Both targets are terminal; invoicing
//! is tracked by `invoice_id`, not by a state.
//!
//! Prices are snapshotted from the catalog when the order is placed (or its
//! lines are replaced while pending) and never re-read afterwards.

use shared::models::{Order, OrderLine, OrderLineInput, OrderState, PendingCount};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

use super::registry::TableRegistry;
use super::secrets;
use super::sessions::VisitSessionManager;
use crate::db::repository::order::{self, LineRow, OrderRow};
use crate::db::repository::{RepoError, dining_table, staff};
use crate::services::catalog::ProductCatalog;
use crate::utils::money;
use crate::utils::validation::validate_order_lines;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Order placement request
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub table_id: i64,
    pub lines: Vec<OrderLineInput>,
    /// Staff user placing the order (None for anonymous devices)
    pub customer_user_id: Option<i64>,
    /// Visit the order belongs to; None takes the table's live code
    pub visit_code: Option<String>,
}

/// Anonymous placement request, authenticated by a device session
#[derive(Debug, Clone)]
pub struct AnonymousOrder {
    pub table_number: i64,
    pub lines: Vec<OrderLineInput>,
    pub session_id: String,
    pub visit_token: String,
}

#[derive(Clone)]
pub struct OrderLedger {
    pool: SqlitePool,
    registry: TableRegistry,
    sessions: VisitSessionManager,
    catalog: Arc<dyn ProductCatalog>,
}

fn order_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", id)
}

fn assemble(row: OrderRow, lines: Vec<OrderLine>) -> AppResult<Order> {
    let state = row.state()?;
    let total = money::to_f64(money::lines_total(&lines));
    Ok(Order {
        id: row.id,
        table_id: row.table_id,
        customer_user_id: row.customer_user_id,
        visit_code: row.visit_code,
        state,
        invoice_id: row.invoice_id,
        created_at: row.created_at,
        lines,
        total,
    })
}

/// Attach lines (grouped by order id) to their headers, keeping header order
fn assemble_all(rows: Vec<OrderRow>, lines: Vec<LineRow>) -> AppResult<Vec<Order>> {
    let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id).or_default().push(line.into());
    }
    rows.into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            assemble(row, lines)
        })
        .collect()
}

impl OrderLedger {
    pub fn new(
        pool: SqlitePool,
        sessions: VisitSessionManager,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            pool,
            registry: sessions.registry().clone(),
            sessions,
            catalog,
        }
    }

    // ========== Placement ==========

    /// Place an order against an open table.
    ///
    /// The open check and the insert are one statement, so a table closing
    /// concurrently either sees the order or rejects it with `TableClosed`.
    pub async fn place(&self, new_order: NewOrder) -> AppResult<Order> {
        validate_order_lines(&new_order.lines)?;
        if let Some(user_id) = new_order.customer_user_id {
            self.ensure_active_staff(user_id).await?;
        }
        let lines = self.snapshot_lines(&new_order.lines).await?;

        let (_guard, _) = self.registry.lock_existing(new_order.table_id).await?;
        self.insert_locked(
            new_order.table_id,
            &lines,
            new_order.customer_user_id,
            new_order.visit_code.as_deref(),
        )
        .await
    }

    /// Place an order from a customer device.
    ///
    /// Session validation runs first; the live table is re-checked under the
    /// table lock afterwards, so a close racing with validation wins.
    pub async fn place_anonymous(&self, request: AnonymousOrder) -> AppResult<Order> {
        let visit = self
            .sessions
            .validate_order_request(&request.session_id, &request.visit_token, request.table_number)
            .await?;

        validate_order_lines(&request.lines)?;
        let lines = self.snapshot_lines(&request.lines).await?;

        let _guard = self.registry.locks().lock(visit.table_id).await;
        let table = self.registry.get_by_id(visit.table_id).await?;
        if !table.is_open {
            return Err(AppError::new(ErrorCode::TableClosed).with_detail("tableNumber", table.number));
        }
        let live_token = table.visit_token.as_deref().unwrap_or_default();
        if !secrets::secrets_match(live_token, &visit.visit_token) {
            return Err(AppError::session_invalid());
        }
        let Some(code) = table.verification_code else {
            return Err(AppError::internal(format!(
                "Open table {} has no verification code",
                table.id
            )));
        };

        let order = self.insert_locked(table.id, &lines, None, Some(&code)).await?;
        tracing::info!(
            order_id = order.id,
            table_id = table.id,
            lines = order.lines.len(),
            "Anonymous order placed"
        );
        Ok(order)
    }

    /// Caller holds the table lock
    async fn insert_locked(
        &self,
        table_id: i64,
        lines: &[OrderLine],
        customer_user_id: Option<i64>,
        visit_code: Option<&str>,
    ) -> AppResult<Order> {
        let order_id = shared::util::snowflake_id();
        let now = shared::util::now_millis();

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let inserted =
            order::insert_if_table_open(&mut *tx, order_id, table_id, customer_user_id, visit_code, now)
                .await?;
        if inserted == 0 {
            drop(tx);
            return Err(match dining_table::find_by_id(&self.pool, table_id).await? {
                Some(table) => {
                    AppError::new(ErrorCode::TableClosed).with_detail("tableNumber", table.number)
                }
                None => AppError::new(ErrorCode::TableNotFound).with_detail("id", table_id),
            });
        }
        order::insert_lines(&mut tx, order_id, lines).await?;
        tx.commit().await.map_err(RepoError::from)?;

        self.get(order_id).await
    }

    async fn ensure_active_staff(&self, user_id: i64) -> AppResult<()> {
        match staff::find_user(&self.pool, user_id).await? {
            Some(user) if user.is_active => Ok(()),
            _ => Err(AppError::new(ErrorCode::StaffUserNotFound).with_detail("userId", user_id)),
        }
    }

    /// Resolve every line against the live catalog price
    async fn snapshot_lines(&self, inputs: &[OrderLineInput]) -> AppResult<Vec<OrderLine>> {
        let mut prices: HashMap<i64, f64> = HashMap::new();
        let mut lines = Vec::with_capacity(inputs.len());
        for input in inputs {
            let price = match prices.get(&input.product_id) {
                Some(price) => *price,
                None => {
                    let product = self
                        .catalog
                        .get_product(input.product_id)
                        .await?
                        .filter(|p| p.is_active)
                        .ok_or_else(|| {
                            AppError::new(ErrorCode::ProductNotFound)
                                .with_detail("productId", input.product_id)
                        })?;
                    if !product.price.is_finite() || product.price < 0.0 {
                        return Err(AppError::new(ErrorCode::ProductInvalidPrice)
                            .with_detail("productId", product.id));
                    }
                    prices.insert(product.id, product.price);
                    product.price
                }
            };
            lines.push(OrderLine {
                product_id: input.product_id,
                quantity: input.quantity,
                unit_price_snapshot: price,
            });
        }
        Ok(lines)
    }

    // ========== State machine ==========

    /// Move a pending order to `Confirmed` or `Rejected`
    pub async fn transition(&self, order_id: i64, target: OrderState) -> AppResult<Order> {
        if target == OrderState::Pending {
            return Err(AppError::new(ErrorCode::OrderInvalidTarget).with_detail("target", target.as_str()));
        }
        let row = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        let _guard = self.registry.locks().lock(row.table_id).await;
        let changed = order::update_state_if_pending(&self.pool, order_id, target).await?;
        if changed == 0 {
            let current = order::find_by_id(&self.pool, order_id)
                .await?
                .ok_or_else(|| order_not_found(order_id))?;
            return Err(AppError::new(ErrorCode::OrderInvalidState)
                .with_detail("orderId", order_id)
                .with_detail("state", current.state));
        }

        tracing::info!(order_id, table_id = row.table_id, state = %target, "Order transitioned");
        self.get(order_id).await
    }

    /// Replace the lines of a pending order, re-snapshotting prices
    pub async fn modify_lines(&self, order_id: i64, inputs: &[OrderLineInput]) -> AppResult<Order> {
        validate_order_lines(inputs)?;
        let row = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        let lines = self.snapshot_lines(inputs).await?;

        let _guard = self.registry.locks().lock(row.table_id).await;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        // Writes first; the state check below sees the row under the table lock
        order::delete_lines(&mut *tx, order_id).await?;
        let current = order::find_by_id(&mut *tx, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        if current.state()? != OrderState::Pending {
            return Err(AppError::new(ErrorCode::OrderInvalidState)
                .with_detail("orderId", order_id)
                .with_detail("state", current.state));
        }
        order::insert_lines(&mut tx, order_id, &lines).await?;
        tx.commit().await.map_err(RepoError::from)?;

        self.get(order_id).await
    }

    // ========== Queries ==========

    pub async fn get(&self, order_id: i64) -> AppResult<Order> {
        let row = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        let lines = order::find_lines(&self.pool, order_id)
            .await?
            .into_iter()
            .map(OrderLine::from)
            .collect();
        assemble(row, lines)
    }

    /// Customer view: orders of the visit identified by `code`, newest first.
    ///
    /// A blank code or an unknown table yields an empty list, never the
    /// unfiltered history.
    pub async fn query_by_visit(&self, table_number: i64, code: &str) -> AppResult<Vec<Order>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(Vec::new());
        }
        let Some(table) = dining_table::find_by_number(&self.pool, table_number).await? else {
            return Ok(Vec::new());
        };
        self.orders_of_visit(table.id, code).await
    }

    /// Staff view: orders of the table's live visit
    pub async fn query_by_visit_admin(&self, table_number: i64) -> AppResult<Vec<Order>> {
        let Some(table) = dining_table::find_by_number(&self.pool, table_number).await? else {
            return Ok(Vec::new());
        };
        match table.verification_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => self.orders_of_visit(table.id, code).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn orders_of_visit(&self, table_id: i64, code: &str) -> AppResult<Vec<Order>> {
        let rows = order::find_by_visit(&self.pool, table_id, code).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let lines = order::find_lines_by_visit(&self.pool, table_id, code).await?;
        assemble_all(rows, lines)
    }

    /// Pending orders per table, for the operator dashboard
    pub async fn pending_counts_by_table(&self) -> AppResult<Vec<PendingCount>> {
        Ok(order::pending_counts(&self.pool).await?)
    }
}
