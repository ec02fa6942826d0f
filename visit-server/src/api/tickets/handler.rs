//! Ticket API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Invoice, InvoiceCreate, InvoiceIssued};

use crate::core::ServerState;
use crate::utils::AppResult;

/// POST /api/tickets - 为已确认订单出票并关台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<InvoiceCreate>,
) -> AppResult<Json<InvoiceIssued>> {
    let ticket = state.invoices.generate(payload.order_id).await?;
    Ok(Json(InvoiceIssued {
        message: format!("Ticket {} issued, table closed", ticket.id),
        ticket,
    }))
}

/// GET /api/tickets/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Invoice>> {
    let ticket = state.invoices.get(id).await?;
    Ok(Json(ticket))
}

/// GET /api/tickets/by-table/:table_id - 最近的小票 (补打)
pub async fn list_by_table(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<Vec<Invoice>>> {
    let tickets = state.invoices.recent_by_table(table_id).await?;
    Ok(Json(tickets))
}
