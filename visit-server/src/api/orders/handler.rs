//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    AnonymousOrderCreate, InvoicePrinted, Order, OrderCreated, OrderLinesUpdate, OrderState,
    OrderStatusUpdate, PendingCount, StaffOrderCreate, VisitOrdersQuery,
};

use crate::auth::{CurrentUser, actions, ensure_permission};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};
use crate::visit::{AnonymousOrder, NewOrder};

/// POST /api/orders/anonymous - 顾客匿名下单 (设备会话)
pub async fn create_anonymous(
    State(state): State<ServerState>,
    Json(payload): Json<AnonymousOrderCreate>,
) -> AppResult<Json<OrderCreated>> {
    let order = state
        .orders
        .place_anonymous(AnonymousOrder {
            table_number: payload.table_number,
            lines: payload.lines,
            session_id: payload.session_id,
            visit_token: payload.visit_token,
        })
        .await?;
    Ok(Json(OrderCreated { order_id: order.id }))
}

/// POST /api/orders - 员工下单
///
/// 未指定 `customerUserId` 时记在当前员工名下
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<StaffOrderCreate>,
) -> AppResult<Json<OrderCreated>> {
    let order = state
        .orders
        .place(NewOrder {
            table_id: payload.table_id,
            lines: payload.lines,
            customer_user_id: Some(payload.customer_user_id.unwrap_or(current_user.id)),
            visit_code: None,
        })
        .await?;
    Ok(Json(OrderCreated { order_id: order.id }))
}

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get(id).await?;
    Ok(Json(order))
}

/// PUT /api/orders/:id - 替换待审核订单的明细 (重新快照价格)
pub async fn update_lines(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderLinesUpdate>,
) -> AppResult<Json<Order>> {
    let order = state.orders.modify_lines(id, &payload.lines).await?;
    Ok(Json(order))
}

/// PUT /api/orders/:id/status - 审核订单
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let required = match payload.status {
        OrderState::Confirmed => actions::ORDERS_CONFIRM,
        OrderState::Rejected => actions::ORDERS_REJECT,
        OrderState::Pending => {
            return Err(AppError::new(ErrorCode::OrderInvalidTarget).with_detail("orderId", id));
        }
    };
    ensure_permission(&current_user, required)?;

    let order = state.orders.transition(id, payload.status).await?;
    tracing::info!(
        order_id = id,
        state = %order.state,
        operator = %current_user.username,
        "Order reviewed"
    );
    Ok(Json(order))
}

/// GET /api/orders/table/:number?code= - 顾客查看本次到访的订单
///
/// 缺少验证码时返回空列表
pub async fn list_by_visit(
    State(state): State<ServerState>,
    Path(number): Path<i64>,
    Query(query): Query<VisitOrdersQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let code = query.code.unwrap_or_default();
    let orders = state.orders.query_by_visit(number, &code).await?;
    Ok(Json(orders))
}

/// GET /api/orders/admin/table/:number - 员工查看当前到访的订单
pub async fn list_by_visit_admin(
    State(state): State<ServerState>,
    Path(number): Path<i64>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.query_by_visit_admin(number).await?;
    Ok(Json(orders))
}

/// GET /api/orders/pending-by-table - 各桌待审核订单数
pub async fn pending_by_table(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<PendingCount>>> {
    let counts = state.orders.pending_counts_by_table().await?;
    Ok(Json(counts))
}

/// POST /api/orders/invoice-printed - 小票打印完成，关台
pub async fn invoice_printed(
    State(state): State<ServerState>,
    Json(payload): Json<InvoicePrinted>,
) -> AppResult<Json<bool>> {
    state.invoices.close_table(payload.table_id).await?;
    Ok(Json(true))
}
