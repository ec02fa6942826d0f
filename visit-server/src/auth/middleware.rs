//! 认证中间件
//!
//! 为员工 JWT 认证和能力授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, Method, Uri};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 顾客侧接口：凭设备会话或验证码访问，不需要员工令牌
fn is_public_api_route(method: &Method, path: &str) -> bool {
    path.starts_with("/api/session/")
        || (method == Method::POST && path == "/api/orders/anonymous")
        || (method == Method::GET && path.starts_with("/api/orders/table/"))
        || (method == Method::POST && path == "/api/tables/verify-code")
        || (method == Method::GET && path.starts_with("/api/tables/number/"))
}

/// 认证中间件 - 要求员工登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，解析能力集后将
/// [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - 顾客侧接口 (扫码、会话校验、匿名下单、按验证码查单)
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
/// | 账号停用 | 401 AccountDisabled |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();

    // 非 API 路由跳过认证 (health 以及 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&state, req.headers(), req.uri()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Validate the bearer token and resolve the caller's capabilities
pub(crate) async fn authenticate(
    state: &ServerState,
    headers: &HeaderMap,
    uri: &Uri,
) -> AppResult<CurrentUser> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!(WARN, "auth_missing", uri = %uri);
            return Err(AppError::not_authenticated());
        }
    };

    let claims = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(WARN, "auth_failed", error = %e, uri = %uri);
            return Err(match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            });
        }
    };

    let id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Malformed subject claim"))?;

    let capabilities = state.capabilities.resolve(id).await.map_err(|e| {
        security_log!(WARN, "auth_rejected", user_id = id, error = %e);
        match e.code {
            ErrorCode::StaffUserNotFound => AppError::invalid_token("Unknown staff user"),
            _ => e,
        }
    })?;

    Ok(CurrentUser {
        id,
        username: claims.username,
        capabilities,
    })
}

/// 权限检查中间件 - 要求特定能力
///
/// # 支持的通配符
///
/// - `"tickets:*"` 匹配所有 tickets 相关操作
/// - `"all"` 匹配所有权限
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/tables", get(handler::list))
///     .layer(middleware::from_fn(require_permission("tables:view")));
/// ```
///
/// # 错误
///
/// 无权限返回 403 PermissionDenied
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;
            ensure_permission(user, permission)?;
            Ok(next.run(req).await)
        })
    }
}

/// Handler-side check for endpoints whose required action depends on the payload
pub fn ensure_permission(user: &CurrentUser, permission: &str) -> AppResult<()> {
    if !user.has_permission(permission) {
        security_log!(
            WARN,
            "permission_denied",
            user_id = user.id,
            username = %user.username,
            required_permission = permission
        );
        return Err(AppError::forbidden(format!("Permission denied: {}", permission)));
    }
    Ok(())
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 从请求扩展中获取 CurrentUser
    ///
    /// # 错误
    ///
    /// 未认证返回 401 NotAuthenticated
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::not_authenticated)
    }
}
