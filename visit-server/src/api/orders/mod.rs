//! Order API Module
//!
//! 顾客匿名下单和按验证码查单为公开路由；其余需要员工能力。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{actions, require_permission};
use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 顾客侧：设备会话 / 验证码
    let public_routes = Router::new()
        .route("/anonymous", post(handler::create_anonymous))
        .route("/table/{number}", get(handler::list_by_visit));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission(actions::ORDERS_CREATE)));

    let view_routes = Router::new()
        .route("/pending-by-table", get(handler::pending_by_table))
        .route("/admin/table/{number}", get(handler::list_by_visit_admin))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission(actions::ORDERS_VIEW)));

    let edit_routes = Router::new()
        .route("/{id}", put(handler::update_lines))
        .layer(middleware::from_fn(require_permission(actions::ORDERS_EDIT)));

    // 小票打印完成后关台
    let close_routes = Router::new()
        .route("/invoice-printed", post(handler::invoice_printed))
        .layer(middleware::from_fn(require_permission(actions::TABLES_CLOSE)));

    // confirm / reject 权限在 handler 内按目标状态检查
    let status_routes = Router::new().route("/{id}/status", put(handler::update_status));

    public_routes
        .merge(create_routes)
        .merge(view_routes)
        .merge(edit_routes)
        .merge(close_routes)
        .merge(status_routes)
}
