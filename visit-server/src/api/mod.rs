//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`session`] - 扫码开台、设备会话校验 (顾客侧)
//! - [`tables`] - 桌台管理、开关台、验证码校验
//! - [`orders`] - 点单、审核、按到访查询
//! - [`tickets`] - 结账小票

pub mod health;
pub mod session;

// Visit engine API
pub mod orders;
pub mod tables;
pub mod tickets;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppResult};
