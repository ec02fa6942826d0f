//! CapabilityGraph 集成测试
//!
//! 组继承、通配授权、缓存失效

mod common;

use common::{ADMIN_USER_ID, CASHIER_GROUP_ID, WAITER_GROUP_ID, setup, staff_member};
use shared::error::ErrorCode;
use visit_server::CurrentUser;
use visit_server::auth::actions;
use visit_server::db::repository::staff;

#[tokio::test]
async fn test_seeded_groups() {
    let env = setup().await;
    let caps = &env.state.capabilities;
    let (waiter, _) = staff_member(&env.state, "lucia", WAITER_GROUP_ID).await;
    let (cashier, _) = staff_member(&env.state, "pablo", CASHIER_GROUP_ID).await;

    assert!(caps.has_capability(waiter, actions::ORDERS_CONFIRM).await.unwrap());
    assert!(!caps.has_capability(waiter, actions::TICKETS_ISSUE).await.unwrap());
    assert!(!caps.has_capability(waiter, actions::TABLES_CLOSE).await.unwrap());

    // cashier 继承 waiter
    assert!(caps.has_capability(cashier, actions::ORDERS_CREATE).await.unwrap());
    assert!(caps.has_capability(cashier, actions::TICKETS_VIEW).await.unwrap());
    assert!(caps.has_capability(cashier, actions::TABLES_CLOSE).await.unwrap());
    assert!(!caps.has_capability(cashier, actions::TABLES_DELETE).await.unwrap());

    assert!(caps.resolve(ADMIN_USER_ID).await.unwrap().is_unrestricted());
    assert_eq!(caps.group_id("cashier").await.unwrap(), CASHIER_GROUP_ID);
}

#[tokio::test]
async fn test_graph_changes_take_effect_immediately() {
    let env = setup().await;
    let caps = &env.state.capabilities;
    let (user, _) = staff_member(&env.state, "marta", WAITER_GROUP_ID).await;
    assert!(!caps.has_capability(user, actions::TABLES_DELETE).await.unwrap());

    // 新组 + 授权 + 父组，缓存必须被丢弃
    let managers = staff::create_group(env.state.pool(), "managers").await.unwrap();
    caps.grant(managers.id, actions::TABLES_DELETE).await.unwrap();
    caps.add_parent(managers.id, CASHIER_GROUP_ID).await.unwrap();
    caps.add_membership(user, managers.id).await.unwrap();

    assert!(caps.has_capability(user, actions::TABLES_DELETE).await.unwrap());
    assert!(caps.has_capability(user, actions::TICKETS_ISSUE).await.unwrap());

    caps.remove_membership(user, managers.id).await.unwrap();
    assert!(!caps.has_capability(user, actions::TABLES_DELETE).await.unwrap());
    assert!(caps.has_capability(user, actions::ORDERS_VIEW).await.unwrap());
}

#[tokio::test]
async fn test_cyclic_parents_resolve() {
    let env = setup().await;
    let caps = &env.state.capabilities;
    let (user, _) = staff_member(&env.state, "iker", WAITER_GROUP_ID).await;

    // waiter -> cashier -> waiter
    caps.add_parent(WAITER_GROUP_ID, CASHIER_GROUP_ID).await.unwrap();
    let set = caps.resolve(user).await.unwrap();
    assert!(set.allows(actions::TICKETS_ISSUE));
    assert!(set.allows(actions::ORDERS_VIEW));
}

#[tokio::test]
async fn test_unknown_user_and_group() {
    let env = setup().await;
    let caps = &env.state.capabilities;

    let err = caps.resolve(999).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StaffUserNotFound);

    let err = caps.group_id("sommeliers").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::GroupNotFound);
}

#[tokio::test]
async fn test_current_user_permissions() {
    let env = setup().await;
    let (id, _) = staff_member(&env.state, "ane", WAITER_GROUP_ID).await;
    let waiter = CurrentUser {
        id,
        username: "ane".into(),
        capabilities: env.state.capabilities.resolve(id).await.unwrap(),
    };
    assert!(!waiter.is_admin());
    assert!(waiter.has_permission(actions::TABLES_OPEN));
    assert!(waiter.has_any_permission(&[actions::TICKETS_ISSUE, actions::ORDERS_REJECT]));
    assert!(!waiter.has_any_permission(&[actions::TICKETS_ISSUE, actions::TABLES_DELETE]));

    let admin = CurrentUser {
        id: ADMIN_USER_ID,
        username: "admin".into(),
        capabilities: env.state.capabilities.resolve(ADMIN_USER_ID).await.unwrap(),
    };
    assert!(admin.is_admin());
    assert!(admin.has_permission(actions::TABLES_DELETE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolves_racing_revocation_never_keep_old_grant() {
    let env = setup().await;
    let caps = env.state.capabilities.clone();
    let (user, _) = staff_member(&env.state, "irene", CASHIER_GROUP_ID).await;

    for _ in 0..20 {
        caps.add_membership(user, CASHIER_GROUP_ID).await.unwrap();
        assert!(caps.has_capability(user, actions::TICKETS_ISSUE).await.unwrap());

        let mut readers = Vec::new();
        for _ in 0..8 {
            let caps = caps.clone();
            readers.push(tokio::spawn(async move { caps.resolve(user).await }));
        }
        caps.remove_membership(user, CASHIER_GROUP_ID).await.unwrap();
        for reader in readers {
            reader.await.unwrap().unwrap();
        }

        // 撤销之后缓存里不能留下旧的能力集
        assert!(!caps.has_capability(user, actions::TICKETS_ISSUE).await.unwrap());
    }
    assert!(caps.cached_users() <= 1);
}
