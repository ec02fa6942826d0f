//! Product catalog collaborator
//!
//! Ordering only needs "does this product exist, and what does it cost right
//! now". The engine depends on the [`ProductCatalog`] trait; the server wires
//! the SQLite implementation.

use async_trait::async_trait;
use shared::models::Product;
use sqlx::SqlitePool;

use crate::db::repository::product;
use crate::utils::AppResult;

/// 商品价格查询
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Live product row, `None` if unknown
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>>;
}

/// Catalog backed by the `product` table. Always reads the live price.
#[derive(Clone, Debug)]
pub struct SqliteProductCatalog {
    pool: SqlitePool,
}

impl SqliteProductCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for SqliteProductCatalog {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(product::find_by_id(&self.pool, id).await?)
    }
}
