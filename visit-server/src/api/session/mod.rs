//! Device Session API 模块
//!
//! 顾客侧接口，不需要员工令牌 (见 `auth::middleware` 白名单)。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/session", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/scan-table", post(handler::scan_table))
        .route("/validate", post(handler::validate))
}
