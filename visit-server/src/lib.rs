//! Visit Server - 桌台到访与点单生命周期服务
//!
//! # 架构概述
//!
//! 顾客扫桌台二维码获得一次「到访」的密钥，凭设备会话匿名下单；员工审核订单、
//! 出票结账，结账即关台并使该次到访的所有设备会话失效。
//!
//! - **引擎** (`visit`): 桌台注册表、设备会话、订单账本、结账出票
//! - **数据库** (`db`): 嵌入式 SQLite (sqlx)
//! - **认证** (`auth`): 员工 JWT + 组能力图
//! - **HTTP API** (`api`, `routes`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! visit-server/src/
//! ├── core/          # 配置、状态、服务器生命周期、后台任务
//! ├── visit/         # 到访引擎 (registry / sessions / ledger / invoice)
//! ├── auth/          # JWT 认证、能力图
//! ├── services/      # 外部协作者 (商品目录)
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 中间件装配
//! ├── utils/         # 日志、金额、校验
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod routes;
pub mod services;
pub mod utils;
pub mod visit;

use std::path::PathBuf;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};
pub use visit::{InvoiceIssuer, OrderLedger, TableRegistry, VisitSessionManager};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger_with_file};

/// Security log helper - records security-related events
///
/// Written under the `security` target, which the file logger keeps in its
/// own never-deleted stream.
///
/// # Examples
/// ```ignore
/// security_log!(WARN, "auth_failed", error = %e, uri = %uri);
/// security_log!(INFO, "table_opened", table_id = id);
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "WARN",
            $($arg)*
        );
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "ERROR",
            $($arg)*
        );
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "INFO",
            $($arg)*
        );
    };
}

/// 加载 `.env` 并初始化日志 (控制台 + WORK_DIR/logs)
///
/// 在 [`Config::from_env`] 之前调用，配置加载期间的告警也能落盘。
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let log_dir = PathBuf::from(work_dir).join("logs");
    init_logger_with_file(&level, json, Some(&log_dir.to_string_lossy()))
}

pub fn print_banner() {
    println!(
        r#"
 _    ___       _ __
| |  / (_)____ (_) /_
| | / / / ___// / __/
| |/ / (__  )/ / /_
|___/_/____/_/\__/
    "#
    );
}
