use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{CapabilityGraph, JwtService};
use crate::core::Config;
use crate::db::DbService;
use crate::services::catalog::{ProductCatalog, SqliteProductCatalog};
use crate::utils::{AppError, AppResult};
use crate::visit::{InvoiceIssuer, OrderLedger, TableLocks, TableRegistry, VisitSessionManager};

/// 服务器状态 - 持有所有服务的共享句柄
///
/// 每个服务内部只持有连接池和 `Arc`，克隆成本极低。没有进程级单例：
/// 引擎实例随 `ServerState` 创建，随进程退出销毁。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | tables | TableRegistry | 桌台状态与访问密钥 |
/// | sessions | VisitSessionManager | 顾客设备会话 |
/// | orders | OrderLedger | 点单与状态机 |
/// | invoices | InvoiceIssuer | 结账与关台 |
/// | capabilities | CapabilityGraph | 员工能力解析 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务
    pub db: DbService,
    pub tables: TableRegistry,
    pub sessions: VisitSessionManager,
    pub orders: OrderLedger,
    pub invoices: InvoiceIssuer,
    pub capabilities: CapabilityGraph,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开数据库并执行迁移
    /// 3. 装配引擎服务
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            AppError::internal(format!("Failed to create work dir {}: {e}", config.work_dir))
        })?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;
        Ok(Self::from_db(config.clone(), db))
    }

    /// 基于已打开的数据库装配 (测试使用)
    pub fn from_db(config: Config, db: DbService) -> Self {
        let pool = db.pool.clone();
        let catalog: Arc<dyn ProductCatalog> = Arc::new(SqliteProductCatalog::new(pool.clone()));

        let tables = TableRegistry::new(pool.clone(), TableLocks::new());
        let sessions = VisitSessionManager::new(pool.clone(), tables.clone());
        let orders = OrderLedger::new(pool.clone(), sessions.clone(), catalog);
        let invoices = InvoiceIssuer::new(pool.clone(), sessions.clone());
        let capabilities = CapabilityGraph::new(pool);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            db,
            tables,
            sessions,
            orders,
            invoices,
            capabilities,
            jwt_service,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
