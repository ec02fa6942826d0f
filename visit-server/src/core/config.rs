use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;
use crate::utils::{AppError, ErrorCode};

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | DATABASE_FILE | visit.db | WORK_DIR 下的 SQLite 文件名 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (由 `setup_environment` 读取) |
/// | LOG_JSON | false | JSON 日志输出 (由 `setup_environment` 读取) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SESSION_IDLE_MINUTES | 240 | 设备会话闲置阈值 |
/// | SESSION_SWEEP_INTERVAL_SECS | 300 | 闲置会话清理周期 (0 关闭) |
/// | JWT_SECRET 等 | - | 见 [`JwtConfig`] |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/visit HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// SQLite 文件名
    pub database_file: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 设备会话闲置阈值 (分钟)
    pub session_idle_minutes: u64,
    /// 闲置会话清理周期 (秒)，0 表示不清理
    pub session_sweep_interval_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；JWT 密钥不合法时返回错误。
    pub fn from_env() -> Result<Self, AppError> {
        let jwt = JwtConfig::from_env()
            .map_err(|e| AppError::with_message(ErrorCode::ConfigError, e.to_string()))?;
        Ok(Self::with_jwt(jwt))
    }

    fn with_jwt(jwt: JwtConfig) -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            database_file: std::env::var("DATABASE_FILE").unwrap_or_else(|_| "visit.db".into()),
            http_port: env_or("HTTP_PORT", 3000),
            jwt,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            session_idle_minutes: env_or("SESSION_IDLE_MINUTES", 240),
            session_sweep_interval_secs: env_or("SESSION_SWEEP_INTERVAL_SECS", 300),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景 (随机 JWT 密钥)
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::with_jwt(JwtConfig::ephemeral());
        config.work_dir = work_dir.into();
        config.database_file = "visit.db".into();
        config.http_port = http_port;
        config
    }

    /// SQLite 文件完整路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.database_file)
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides("/tmp/visit-test", 0);
        assert_eq!(config.work_dir, "/tmp/visit-test");
        assert_eq!(config.http_port, 0);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/visit-test/visit.db"));
        assert!(config.jwt.secret.len() >= 32);
    }
}
