//! InvoiceIssuer - 结账与关台
//!
//! Issuing a ticket ends the visit: the table is closed (token and code
//! dropped) and only then are its device sessions deactivated, all inside
//! one transaction under the table lock.

use shared::models::{Invoice, OrderLine, OrderState};
use sqlx::{SqliteConnection, SqlitePool};

use super::registry::TableRegistry;
use super::sessions::VisitSessionManager;
use crate::db::repository::order::{self, OrderRow};
use crate::db::repository::{RepoError, invoice};
use crate::utils::money;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Re-print history size
pub const RECENT_INVOICES: i64 = 5;

/// Options for [`InvoiceIssuer::generate_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Leave the table open (batching several orders before one close)
    pub skip_close_table: bool,
}

#[derive(Clone)]
pub struct InvoiceIssuer {
    pool: SqlitePool,
    registry: TableRegistry,
    sessions: VisitSessionManager,
}

impl InvoiceIssuer {
    pub fn new(pool: SqlitePool, sessions: VisitSessionManager) -> Self {
        Self {
            pool,
            registry: sessions.registry().clone(),
            sessions,
        }
    }

    /// Ticket for one confirmed order, then close its table
    pub async fn generate(&self, order_id: i64) -> AppResult<Invoice> {
        self.generate_with(order_id, GenerateOptions::default()).await
    }

    pub async fn generate_with(&self, order_id: i64, options: GenerateOptions) -> AppResult<Invoice> {
        let head = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))?;
        let table_id = head.table_id;

        let _guard = self.registry.locks().lock(table_id).await;
        // Re-read under the lock: state and invoice_id only change while it is held
        let row = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))?;
        ensure_billable(&row)?;
        let total = self.total_of(row.id).await?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let ticket = self.bill_in(&mut tx, table_id, row.id, total).await?;
        if !options.skip_close_table {
            self.close_in(&mut tx, table_id).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            invoice_id = ticket.id,
            order_id,
            table_id,
            total = ticket.total,
            closed = !options.skip_close_table,
            "Ticket issued"
        );
        Ok(ticket)
    }

    /// End the visit: close the table, then revoke its sessions
    pub async fn close_table(&self, table_id: i64) -> AppResult<()> {
        let (_guard, _) = self.registry.lock_existing(table_id).await?;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        self.close_in(&mut tx, table_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(())
    }

    /// Close from the table status flow.
    ///
    /// Refuses while any order is pending. Otherwise every confirmed order
    /// without a ticket gets one (table close suppressed) and the table is
    /// closed once at the end. All or nothing.
    pub async fn close_table_with_pending_check(&self, table_id: i64) -> AppResult<Vec<Invoice>> {
        let (_guard, _) = self.registry.lock_existing(table_id).await?;

        let pending = order::count_by_state(&self.pool, table_id, OrderState::Pending).await?;
        if pending > 0 {
            return Err(AppError::new(ErrorCode::TableHasPendingOrders)
                .with_detail("tableId", table_id)
                .with_detail("pending", pending));
        }

        let unbilled = order::find_uninvoiced_confirmed(&self.pool, table_id).await?;
        let mut totals = Vec::with_capacity(unbilled.len());
        for row in &unbilled {
            totals.push((row.id, self.total_of(row.id).await?));
        }

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let mut tickets = Vec::with_capacity(totals.len());
        for (order_id, total) in totals {
            tickets.push(self.bill_in(&mut tx, table_id, order_id, total).await?);
        }
        self.close_in(&mut tx, table_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(table_id, tickets = tickets.len(), "Table closed after billing");
        Ok(tickets)
    }

    /// Registry close strictly before session invalidation
    async fn close_in(&self, conn: &mut SqliteConnection, table_id: i64) -> AppResult<()> {
        self.registry.close_in(&mut *conn, table_id).await?;
        self.sessions.invalidate_all_in(&mut *conn, table_id).await?;
        Ok(())
    }

    /// Σ quantity × unit_price_snapshot of one order
    async fn total_of(&self, order_id: i64) -> AppResult<f64> {
        let lines: Vec<OrderLine> = order::find_lines(&self.pool, order_id)
            .await?
            .into_iter()
            .map(OrderLine::from)
            .collect();
        Ok(money::to_f64(money::lines_total(&lines)))
    }

    /// Persist one ticket and attach it to its order. Writes only.
    async fn bill_in(
        &self,
        conn: &mut SqliteConnection,
        table_id: i64,
        order_id: i64,
        total: f64,
    ) -> AppResult<Invoice> {
        let invoice_id = shared::util::snowflake_id();
        let now = shared::util::now_millis();

        invoice::insert(&mut *conn, invoice_id, table_id, total, now).await?;
        let attached = order::attach_invoice(&mut *conn, order_id, invoice_id).await?;
        if attached == 0 {
            return Err(AppError::new(ErrorCode::OrderAlreadyInvoiced).with_detail("orderId", order_id));
        }

        Ok(Invoice {
            id: invoice_id,
            table_id,
            total,
            created_at: now,
            order_ids: vec![order_id],
        })
    }

    // ========== Queries ==========

    pub async fn get(&self, invoice_id: i64) -> AppResult<Invoice> {
        let mut ticket = invoice::find_by_id(&self.pool, invoice_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::InvoiceNotFound).with_detail("invoiceId", invoice_id))?;
        ticket.order_ids = order::find_ids_by_invoice(&self.pool, invoice_id).await?;
        Ok(ticket)
    }

    /// Latest tickets of a table, newest first
    pub async fn recent_by_table(&self, table_id: i64) -> AppResult<Vec<Invoice>> {
        let mut tickets = invoice::find_recent_by_table(&self.pool, table_id, RECENT_INVOICES).await?;
        for ticket in &mut tickets {
            ticket.order_ids = order::find_ids_by_invoice(&self.pool, ticket.id).await?;
        }
        Ok(tickets)
    }
}

/// Only confirmed orders without a ticket can be billed
fn ensure_billable(row: &OrderRow) -> AppResult<()> {
    let state = row.state()?;
    if state != OrderState::Confirmed {
        return Err(AppError::new(ErrorCode::OrderInvalidState)
            .with_detail("orderId", row.id)
            .with_detail("state", state.as_str()));
    }
    if row.invoice_id.is_some() {
        return Err(AppError::new(ErrorCode::OrderAlreadyInvoiced).with_detail("orderId", row.id));
    }
    Ok(())
}
