//! 集成测试公共工具
//!
//! 每个测试一个临时目录 + 独立 SQLite 文件，迁移自动执行。

#![allow(dead_code)]

use shared::models::{DiningTable, OrderLineInput, Product};
use tempfile::TempDir;
use visit_server::db::DbService;
use visit_server::db::repository::{product, staff};
use visit_server::{Config, ServerState};

/// Built-in groups seeded by the initial migration
pub const ADMIN_GROUP_ID: i64 = 1;
pub const WAITER_GROUP_ID: i64 = 2;
pub const CASHIER_GROUP_ID: i64 = 3;

/// Built-in admin user
pub const ADMIN_USER_ID: i64 = 1;

pub struct TestEnv {
    pub state: ServerState,
    // 保持临时目录存活到测试结束
    _dir: TempDir,
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let db = DbService::new(&config.database_path().to_string_lossy())
        .await
        .expect("open test database");
    TestEnv {
        state: ServerState::from_db(config, db),
        _dir: dir,
    }
}

pub async fn seed_product(state: &ServerState, name: &str, price: f64) -> Product {
    product::create(state.pool(), name, price)
        .await
        .expect("seed product")
}

pub async fn seed_table(state: &ServerState, number: i64) -> DiningTable {
    state.tables.add(number).await.expect("seed table")
}

pub fn line(product_id: i64, quantity: i64) -> OrderLineInput {
    OrderLineInput {
        product_id,
        quantity,
    }
}

/// Staff user in one group, returns (user id, bearer token)
pub async fn staff_member(state: &ServerState, username: &str, group_id: i64) -> (i64, String) {
    let user = staff::create_user(state.pool(), username)
        .await
        .expect("create staff user");
    state
        .capabilities
        .add_membership(user.id, group_id)
        .await
        .expect("add membership");
    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.username)
        .expect("issue token");
    (user.id, token)
}

pub fn admin_token(state: &ServerState) -> String {
    state
        .get_jwt_service()
        .generate_token(ADMIN_USER_ID, "admin")
        .expect("issue token")
}
