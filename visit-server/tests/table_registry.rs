//! TableRegistry 集成测试
//!
//! 开台幂等、关台清除密钥、验证码校验、桌台管理

mod common;

use common::{line, seed_product, seed_table, setup};
use shared::error::{ErrorCode, ErrorKind};
use visit_server::visit::NewOrder;

#[tokio::test]
async fn test_tables_are_created_closed() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;

    let stored = env.state.tables.get(5).await.unwrap();
    assert_eq!(stored.id, table.id);
    assert!(!stored.is_open);
    assert!(stored.visit_token.is_none());
    assert!(stored.verification_code.is_none());
}

#[tokio::test]
async fn test_open_is_idempotent_while_open() {
    let env = setup().await;
    seed_table(&env.state, 5).await;

    let first = env.state.tables.open(5).await.unwrap();
    assert!(first.rotated);
    assert_eq!(first.verification_code.len(), 6);
    assert!(first.verification_code.chars().all(|c| c.is_ascii_digit()));

    // 第二次扫码：同一对密钥
    let second = env.state.tables.open(5).await.unwrap();
    assert!(!second.rotated);
    assert_eq!(second.visit_token, first.visit_token);
    assert_eq!(second.verification_code, first.verification_code);
}

#[tokio::test]
async fn test_reopen_rotates_token() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let opening = env.state.tables.open(5).await.unwrap();
        assert!(opening.rotated);
        assert!(seen.insert(opening.visit_token.clone()), "token reused");
        env.state.tables.close(table.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_closed_table_holds_no_secrets() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;
    env.state.tables.open(5).await.unwrap();

    env.state.tables.close(table.id).await.unwrap();

    let stored = env.state.tables.get_by_id(table.id).await.unwrap();
    assert!(!stored.is_open);
    assert!(stored.visit_token.is_none());
    assert!(stored.verification_code.is_none());
    for listed in env.state.tables.list().await.unwrap() {
        assert!(listed.is_open || listed.visit_token.is_none());
    }
}

#[tokio::test]
async fn test_close_is_idempotent_and_checks_existence() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;

    env.state.tables.close(table.id).await.unwrap();
    env.state.tables.close(table.id).await.unwrap();

    let err = env.state.tables.close(424242).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_verify_code() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;
    let opening = env.state.tables.open(5).await.unwrap();
    let code = opening.verification_code.clone();

    assert!(env.state.tables.verify_code(5, &code).await.unwrap());
    assert!(!env.state.tables.verify_code(5, "").await.unwrap());
    assert!(!env.state.tables.verify_code(5, "   ").await.unwrap());
    assert!(!env.state.tables.verify_code(99, &code).await.unwrap());

    let wrong = if code == "100000" { "100001" } else { "100000" };
    assert!(!env.state.tables.verify_code(5, wrong).await.unwrap());

    // 关台后旧验证码失效
    env.state.tables.close(table.id).await.unwrap();
    assert!(!env.state.tables.verify_code(5, &code).await.unwrap());
}

#[tokio::test]
async fn test_lookups_fail_not_found() {
    let env = setup().await;
    assert_eq!(
        env.state.tables.get(7).await.unwrap_err().code,
        ErrorCode::TableNotFound
    );
    assert_eq!(
        env.state.tables.get_by_id(7).await.unwrap_err().code,
        ErrorCode::TableNotFound
    );
    assert_eq!(
        env.state.tables.open(7).await.unwrap_err().code,
        ErrorCode::TableNotFound
    );
}

#[tokio::test]
async fn test_add_rejects_duplicates_and_bad_numbers() {
    let env = setup().await;
    seed_table(&env.state, 5).await;

    let dup = env.state.tables.add(5).await.unwrap_err();
    assert_eq!(dup.code, ErrorCode::TableNumberExists);
    assert_eq!(dup.kind(), ErrorKind::Conflict);

    for number in [0, -3] {
        let err = env.state.tables.add(number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTableNumber);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

#[tokio::test]
async fn test_modify_renumbers() {
    let env = setup().await;
    let table = seed_table(&env.state, 5).await;
    seed_table(&env.state, 6).await;

    let renamed = env.state.tables.modify(table.id, 15).await.unwrap();
    assert_eq!(renamed.number, 15);
    assert!(env.state.tables.get(15).await.is_ok());

    let err = env.state.tables.modify(table.id, 6).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNumberExists);
    let err = env.state.tables.modify(987, 20).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
}

#[tokio::test]
async fn test_list_is_ordered_by_number() {
    let env = setup().await;
    for number in [12, 3, 7] {
        seed_table(&env.state, number).await;
    }
    let numbers: Vec<i64> = env
        .state
        .tables
        .list()
        .await
        .unwrap()
        .iter()
        .map(|t| t.number)
        .collect();
    assert_eq!(numbers, vec![3, 7, 12]);
}

#[tokio::test]
async fn test_remove_guards() {
    let env = setup().await;
    let free = seed_table(&env.state, 1).await;
    let busy = seed_table(&env.state, 2).await;
    let product = seed_product(&env.state, "Agua", 1.5).await;

    // 开台中
    env.state.tables.open(2).await.unwrap();
    let err = env.state.tables.remove(busy.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableOccupied);

    // 关台后仍有订单
    env.state
        .orders
        .place(NewOrder {
            table_id: busy.id,
            lines: vec![line(product.id, 1)],
            customer_user_id: None,
            visit_code: None,
        })
        .await
        .unwrap();
    env.state.tables.close(busy.id).await.unwrap();
    let err = env.state.tables.remove(busy.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableHasOrders);

    env.state.tables.remove(free.id).await.unwrap();
    assert_eq!(
        env.state.tables.get(1).await.unwrap_err().code,
        ErrorCode::TableNotFound
    );
    assert_eq!(
        env.state.tables.remove(free.id).await.unwrap_err().code,
        ErrorCode::TableNotFound
    );
}

#[tokio::test]
async fn test_unknown_table_ids_leave_no_lock_behind() {
    let env = setup().await;
    let product = seed_product(&env.state, "Agua", 1.5).await;
    let before = env.state.tables.locks().len();

    for offset in 0..50 {
        let unknown = 424_242 + offset;
        let results = [
            env.state.invoices.close_table(unknown).await.map(|_| ()),
            env.state
                .invoices
                .close_table_with_pending_check(unknown)
                .await
                .map(|_| ()),
            env.state.sessions.open_table(unknown).await.map(|_| ()),
            env.state.sessions.invalidate_all(unknown).await.map(|_| ()),
            env.state.tables.close(unknown).await,
            env.state.tables.modify(unknown, 9).await.map(|_| ()),
            env.state.tables.remove(unknown).await,
            env.state
                .orders
                .place(NewOrder {
                    table_id: unknown,
                    lines: vec![line(product.id, 1)],
                    customer_user_id: None,
                    visit_code: None,
                })
                .await
                .map(|_| ()),
        ];
        for result in results {
            assert_eq!(result.unwrap_err().code, ErrorCode::TableNotFound);
        }
    }

    assert_eq!(env.state.tables.locks().len(), before);
}

#[tokio::test]
async fn test_remove_releases_table_lock() {
    let env = setup().await;
    let table = seed_table(&env.state, 1).await;

    env.state.tables.close(table.id).await.unwrap();
    let held = env.state.tables.locks().len();
    assert!(held >= 1);

    env.state.tables.remove(table.id).await.unwrap();
    assert_eq!(env.state.tables.locks().len(), held - 1);
}
