//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, TablePublicView, TableStatusChanged,
    TableStatusUpdate, VerifyCodeRequest, VerifyCodeResponse,
};

use crate::auth::{CurrentUser, actions, ensure_permission};
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/tables - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = state.tables.list().await?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = state.tables.get_by_id(id).await?;
    Ok(Json(table))
}

/// GET /api/tables/number/:number - 顾客侧桌台信息 (不含密钥)
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<i64>,
) -> AppResult<Json<TablePublicView>> {
    let table = state.tables.get(number).await?;
    Ok(Json(TablePublicView::from(&table)))
}

/// POST /api/tables - 创建桌台 (初始为关闭)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = state.tables.add(payload.number).await?;
    Ok(Json(table))
}

/// PUT /api/tables/:id - 修改桌号
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    let table = state.tables.modify(id, payload.number).await?;
    Ok(Json(table))
}

/// DELETE /api/tables/:id - 删除桌台 (开台中或有订单时拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.tables.remove(id).await?;
    Ok(Json(true))
}

/// PUT /api/tables/:id/status - 员工开台/关台
///
/// 开台沿用扫码的轮换规则；关台要求没有待审核订单，并为未结账的已确认
/// 订单出票后一次性关台。
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<TableStatusChanged>> {
    if payload.is_open {
        ensure_permission(&current_user, actions::TABLES_OPEN)?;
        let opening = state.sessions.open_table(id).await?;
        tracing::info!(
            table_id = id,
            rotated = opening.rotated,
            operator = %current_user.username,
            "Table opened by staff"
        );
        Ok(Json(TableStatusChanged {
            table: opening.table,
            tickets: Vec::new(),
        }))
    } else {
        ensure_permission(&current_user, actions::TABLES_CLOSE)?;
        let tickets = state.invoices.close_table_with_pending_check(id).await?;
        let table = state.tables.get_by_id(id).await?;
        tracing::info!(
            table_id = id,
            tickets = tickets.len(),
            operator = %current_user.username,
            "Table closed by staff"
        );
        Ok(Json(TableStatusChanged { table, tickets }))
    }
}

/// POST /api/tables/verify-code - 顾客验证码校验
pub async fn verify_code(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> AppResult<Json<VerifyCodeResponse>> {
    let valid = state
        .tables
        .verify_code(payload.table_number, &payload.code)
        .await?;
    let message = if valid {
        "Verification code accepted"
    } else {
        "Invalid verification code or table not open"
    };
    Ok(Json(VerifyCodeResponse {
        valid,
        message: message.to_string(),
    }))
}
