//! Device Session API Handlers

use axum::{Json, extract::State};
use shared::models::{ScanTableRequest, ScanTableResponse, SessionValidation, ValidateSessionRequest};

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::validate_table_number;

/// POST /api/session/scan-table - 扫码：开台 (如需要) 并签发设备会话
pub async fn scan_table(
    State(state): State<ServerState>,
    Json(payload): Json<ScanTableRequest>,
) -> AppResult<Json<ScanTableResponse>> {
    validate_table_number(payload.table_number)?;
    let issued = state.sessions.open_visit(payload.table_number).await?;
    Ok(Json(ScanTableResponse {
        visit_token: issued.visit_token,
        session_id: issued.session_id,
    }))
}

/// POST /api/session/validate - 校验设备会话
///
/// 校验失败返回 `{valid:false}` 而不是错误状态码
pub async fn validate(
    State(state): State<ServerState>,
    Json(payload): Json<ValidateSessionRequest>,
) -> AppResult<Json<SessionValidation>> {
    let result = state
        .sessions
        .validate(&payload.session_id, &payload.visit_token)
        .await?;
    Ok(Json(result))
}
