//! Ticket (Invoice) API 模块
//!
//! 出票即结束本次到访：桌台关闭，设备会话全部失效。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{actions, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tickets", routes())
}

fn routes() -> Router<ServerState> {
    let issue_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission(actions::TICKETS_ISSUE)));

    let view_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/by-table/{table_id}", get(handler::list_by_table))
        .layer(middleware::from_fn(require_permission(actions::TICKETS_VIEW)));

    issue_routes.merge(view_routes)
}
