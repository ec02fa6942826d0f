//! 服务层 - 引擎依赖的外部协作者
//!
//! # 服务列表
//!
//! - [`ProductCatalog`] - 商品与现价查询 (下单时快照价格)

pub mod catalog;

pub use catalog::{ProductCatalog, SqliteProductCatalog};
