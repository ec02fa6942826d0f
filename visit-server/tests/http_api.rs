//! HTTP 接口测试
//!
//! 通过完整的中间件栈调用路由 (tower oneshot)，覆盖顾客流程、员工认证与授权、
//! 错误码到状态码的映射。

mod common;

use axum::Router;
use axum::body::Body;
use common::{
    CASHIER_GROUP_ID, WAITER_GROUP_ID, admin_token, seed_product, seed_table, setup, staff_member,
};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use visit_server::routes::build_app;

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    seed_table(&env.state, 1).await;
    seed_table(&env.state, 2).await;
    env.state.tables.open(2).await.unwrap();

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, Method::GET, "/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["floor"]["tables"], 2);
    assert_eq!(body["floor"]["open_tables"], 1);
    assert_eq!(body["floor"]["pending_orders"], 0);
}

#[tokio::test]
async fn test_customer_flow() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    seed_table(&env.state, 7).await;
    let tortilla = seed_product(&env.state, "Tortilla", 8.5).await;

    // 扫码
    let (status, scan) = call(
        &app,
        Method::POST,
        "/api/session/scan-table",
        None,
        Some(json!({ "tableNumber": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = scan["sessionId"].as_str().unwrap().to_string();
    let visit_token = scan["visitToken"].as_str().unwrap().to_string();

    // 校验会话
    let (status, validation) = call(
        &app,
        Method::POST,
        "/api/session/validate",
        None,
        Some(json!({ "sessionId": session_id, "visitToken": visit_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], true);
    assert_eq!(validation["tableNumber"], 7);

    // 匿名下单
    let (status, created) = call(
        &app,
        Method::POST,
        "/api/orders/anonymous",
        None,
        Some(json!({
            "tableNumber": 7,
            "lines": [{ "productId": tortilla.id, "quantity": 2 }],
            "sessionId": session_id,
            "visitToken": visit_token,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = created["orderId"].as_i64().unwrap();

    // 凭验证码查单
    let code = env
        .state
        .tables
        .get(7)
        .await
        .unwrap()
        .verification_code
        .unwrap();
    let (status, orders) = call(
        &app,
        Method::GET,
        &format!("/api/orders/table/7?code={code}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id);
    assert_eq!(orders[0]["state"], "pending");
    assert_eq!(orders[0]["total"], 17.0);

    // 错误验证码看不到任何订单
    let (status, orders) =
        call(&app, Method::GET, "/api/orders/table/7?code=WRONG", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());

    let (status, verified) = call(
        &app,
        Method::POST,
        "/api/tables/verify-code",
        None,
        Some(json!({ "tableNumber": 7, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["valid"], true);
}

#[tokio::test]
async fn test_invalid_session_is_unauthorized() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    seed_table(&env.state, 7).await;
    let water = seed_product(&env.state, "Agua", 1.5).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/orders/anonymous",
        None,
        Some(json!({
            "tableNumber": 7,
            "lines": [{ "productId": water.id, "quantity": 1 }],
            "sessionId": "00000000000000000000000000000000",
            "visitToken": "nope",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["code"].as_u64().is_some());

    // validate 不报错，只返回 valid=false
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/session/validate",
        None,
        Some(json!({ "sessionId": "missing", "visitToken": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_staff_routes_require_token() {
    let env = setup().await;
    let app = build_app(env.state.clone());

    let (status, _) = call(&app, Method::GET, "/api/tables", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/tables", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = admin_token(&env.state);
    let (status, tables) = call(&app, Method::GET, "/api/tables", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tables.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_waiter_confirms_but_cannot_issue_tickets() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    let table = seed_table(&env.state, 3).await;
    let cana = seed_product(&env.state, "Caña", 2.0).await;
    let (_, waiter) = staff_member(&env.state, "lucia", WAITER_GROUP_ID).await;

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/tables/{}/status", table.id),
        Some(&waiter),
        Some(json!({ "isOpen": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(&waiter),
        Some(json!({ "tableId": table.id, "lines": [{ "productId": cana.id, "quantity": 3 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = created["orderId"].as_i64().unwrap();

    let (status, order) = call(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}/status"),
        Some(&waiter),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["state"], "confirmed");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/tickets",
        Some(&waiter),
        Some(json!({ "orderId": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 只有管理员可以删桌
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/tables/{}", table.id),
        Some(&waiter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cashier_ticket_closes_visit() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    let table = seed_table(&env.state, 9).await;
    let cafe = seed_product(&env.state, "Café", 1.3).await;
    let (_, cashier) = staff_member(&env.state, "pablo", CASHIER_GROUP_ID).await;

    let issued = env.state.sessions.open_visit(9).await.unwrap();
    let (status, created) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(&cashier),
        Some(json!({ "tableId": table.id, "lines": [{ "productId": cafe.id, "quantity": 2 }] })),
    )
    .await;
    // 收银继承服务员组的点单能力
    assert_eq!(status, StatusCode::OK);
    let order_id = created["orderId"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}/status"),
        Some(&cashier),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, issued_ticket) = call(
        &app,
        Method::POST,
        "/api/tickets",
        Some(&cashier),
        Some(json!({ "orderId": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issued_ticket["ticket"]["total"], 2.6);
    assert_eq!(issued_ticket["ticket"]["orderIds"], json!([order_id]));

    let (status, view) = call(&app, Method::GET, "/api/tables/number/9", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["isOpen"], false);

    let (_, validation) = call(
        &app,
        Method::POST,
        "/api/session/validate",
        None,
        Some(json!({ "sessionId": issued.session_id, "visitToken": issued.visit_token })),
    )
    .await;
    assert_eq!(validation["valid"], false);

    let (status, history) = call(
        &app,
        Method::GET,
        &format!("/api/tickets/by-table/{}", table.id),
        Some(&cashier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_close_with_pending_orders_conflicts() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    let table = seed_table(&env.state, 4).await;
    let pan = seed_product(&env.state, "Pan", 1.0).await;
    let token = admin_token(&env.state);

    let (status, opened) = call(
        &app,
        Method::PUT,
        &format!("/api/tables/{}/status", table.id),
        Some(&token),
        Some(json!({ "isOpen": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opened["table"]["isOpen"], true);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({ "tableId": table.id, "lines": [{ "productId": pan.id, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/tables/{}/status", table.id),
        Some(&token),
        Some(json!({ "isOpen": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["pending"], 1);

    let (status, pending) =
        call(&app, Method::GET, "/api/orders/pending-by-table", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["tableNumber"], 4);
    assert_eq!(pending[0]["pending"], 1);
}

#[tokio::test]
async fn test_public_table_view_hides_secrets() {
    let env = setup().await;
    let app = build_app(env.state.clone());
    seed_table(&env.state, 2).await;
    env.state.tables.open(2).await.unwrap();

    let (status, view) = call(&app, Method::GET, "/api/tables/number/2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["number"], 2);
    assert_eq!(view["isOpen"], true);
    assert!(view.get("verificationCode").is_none());
    assert!(view.get("visitToken").is_none());

    let (status, _) = call(&app, Method::GET, "/api/tables/number/99", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slow_request_times_out_with_408() {
    let env = setup().await;
    let table = seed_table(&env.state, 4).await;
    let mut state = env.state.clone();
    state.config.request_timeout_ms = 100;
    let app = build_app(state);

    // 另一个操作占住桌台锁，扫码只能等待
    let guard = env.state.tables.locks().lock(table.id).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/session/scan-table",
        None,
        Some(json!({ "tableNumber": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, Value::Null);

    drop(guard);
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/session/scan-table",
        None,
        Some(json!({ "tableNumber": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
