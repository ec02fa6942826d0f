use thiserror::Error;

use crate::utils::AppError;

/// 服务器生命周期错误 (启动、监听、关闭)
///
/// 请求级错误使用 [`AppError`]。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("初始化失败: {0}")]
    Init(#[from] AppError),

    #[error("端口监听失败: {0}")]
    Bind(#[source] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

/// 服务器生命周期的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
