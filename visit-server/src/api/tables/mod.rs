//! Dining Table API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/tables | GET | tables:view |
//! | /api/tables/{id} | GET | tables:view |
//! | /api/tables | POST | tables:manage |
//! | /api/tables/{id} | PUT | tables:manage |
//! | /api/tables/{id} | DELETE | tables:delete |
//! | /api/tables/{id}/status | PUT | tables:open / tables:close (按目标状态) |
//! | /api/tables/verify-code | POST | 公开 |
//! | /api/tables/number/{number} | GET | 公开 |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{actions, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    // 顾客侧
    let public_routes = Router::new()
        .route("/verify-code", post(handler::verify_code))
        .route("/number/{number}", get(handler::get_by_number));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission(actions::TABLES_VIEW)));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_permission(actions::TABLES_MANAGE)));

    let delete_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission(actions::TABLES_DELETE)));

    // 权限取决于目标状态，在 handler 内检查
    let status_routes = Router::new().route("/{id}/status", put(handler::update_status));

    public_routes
        .merge(read_routes)
        .merge(manage_routes)
        .merge(delete_routes)
        .merge(status_routes)
}
