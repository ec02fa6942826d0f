//! JWT 令牌服务
//!
//! 处理员工访问令牌的生成、验证和解析。令牌只携带身份；能力在每次请求时
//! 由 [`CapabilityGraph`](super::CapabilityGraph) 解析，组成员变化立即生效。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::capabilities::CapabilitySet;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (应至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl JwtConfig {
    /// 从环境变量加载
    ///
    /// 缺少 `JWT_SECRET` 时，debug 构建生成临时密钥，release 构建返回错误。
    pub fn from_env() -> Result<Self, JwtError> {
        let secret = load_jwt_secret()?;
        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(720), // 默认 12 小时 (一个班次)
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "visit-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "visit-staff".to_string()),
        })
    }

    /// 使用随机密钥的配置 (测试与开发)
    pub fn ephemeral() -> Self {
        Self {
            secret: generate_secure_printable_jwt_secret(),
            expiration_minutes: 60,
            issuer: "visit-server".to_string(),
            audience: "visit-staff".to_string(),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 员工 ID (Subject)
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 令牌类型
    pub token_type: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// 生成可打印的安全 JWT 密钥 (64 字符)
pub fn generate_secure_printable_jwt_secret() -> String {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_=+.:";

    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    if rng.fill(&mut bytes).is_err() {
        // 随机源不可用时退化为时间戳派生的密钥，仅用于开发环境
        return format!("visit-server-dev-{:032x}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    }
    bytes
        .iter()
        .map(|b| ALLOWED[*b as usize % ALLOWED.len()] as char)
        .collect()
}

/// 从环境变量安全地加载 JWT 密钥
fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => checked_secret(secret),
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "⚠️  JWT_SECRET not set! Generating secure temporary key for development."
                );
                Ok(generate_secure_printable_jwt_secret())
            }
            #[cfg(not(debug_assertions))]
            {
                Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production!".to_string(),
                ))
            }
        }
    }
}

/// 签发长期令牌时必须使用显式配置的密钥，任何构建都不生成临时密钥
pub fn require_jwt_secret() -> Result<String, JwtError> {
    required_secret(std::env::var("JWT_SECRET").ok())
}

fn required_secret(value: Option<String>) -> Result<String, JwtError> {
    match value {
        Some(secret) => checked_secret(secret),
        None => Err(JwtError::ConfigError(
            "JWT_SECRET must be set to issue tokens".to_string(),
        )),
    }
}

fn checked_secret(secret: String) -> Result<String, JwtError> {
    if secret.len() < 32 {
        return Err(JwtError::ConfigError(
            "JWT_SECRET must be at least 32 characters long".to_string(),
        ));
    }
    Ok(secret)
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// 使用指定配置创建新的 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为员工生成新令牌
    pub fn generate_token(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type: "access".to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        if token_data.claims.token_type != "access" {
            return Err(JwtError::InvalidToken("Unexpected token type".to_string()));
        }

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// 当前员工上下文
///
/// 由认证中间件创建：身份来自 JWT，能力集来自组图解析。
///
/// # 示例
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> AppResult<Json<()>> {
///     if user.has_permission("orders:confirm") {
///         // 有权限
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// 员工 ID
    pub id: i64,
    /// 用户名
    pub username: String,
    /// 解析后的能力集
    pub capabilities: Arc<CapabilitySet>,
}

impl CurrentUser {
    /// 是否管理员 (admin 组成员或拥有 `all`)
    pub fn is_admin(&self) -> bool {
        self.capabilities.is_unrestricted()
    }

    /// 检查是否拥有指定权限
    ///
    /// 支持通配符匹配：`"tickets:*"` 匹配 `"tickets:issue"`。
    pub fn has_permission(&self, permission: &str) -> bool {
        self.capabilities.allows(permission)
    }

    /// 检查是否拥有任一指定权限
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }
}
