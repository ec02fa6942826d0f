//! 认证授权模块
//!
//! 员工侧访问控制 (顾客侧由设备会话负责，见 [`crate::visit`])：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CapabilityGraph`] - 组/父组能力图与缓存
//! - [`CurrentUser`] - 当前员工上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] - 权限检查中间件

pub mod capabilities;
pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use capabilities::{CapabilityGraph, CapabilitySet};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, require_jwt_secret};
pub use middleware::{CurrentUserExt, ensure_permission, require_auth, require_permission};

/// Staff action names
pub mod actions {
    pub const TABLES_VIEW: &str = "tables:view";
    pub const TABLES_MANAGE: &str = "tables:manage";
    pub const TABLES_DELETE: &str = "tables:delete";
    pub const TABLES_OPEN: &str = "tables:open";
    pub const TABLES_CLOSE: &str = "tables:close";
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_EDIT: &str = "orders:edit";
    pub const ORDERS_VIEW: &str = "orders:view";
    pub const ORDERS_CONFIRM: &str = "orders:confirm";
    pub const ORDERS_REJECT: &str = "orders:reject";
    pub const TICKETS_ISSUE: &str = "tickets:issue";
    pub const TICKETS_VIEW: &str = "tickets:view";
}
