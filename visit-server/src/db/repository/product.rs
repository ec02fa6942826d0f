//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::Product;
use sqlx::SqliteExecutor;

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, is_active FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

pub async fn create<'e>(db: impl SqliteExecutor<'e>, name: &str, price: f64) -> RepoResult<Product> {
    if !price.is_finite() || price < 0.0 {
        return Err(RepoError::Validation(format!("Invalid price: {price}")));
    }
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO product (id, name, price, is_active) VALUES (?, ?, ?, 1) RETURNING id, name, price, is_active",
    )
    .bind(shared::util::snowflake_id())
    .bind(name)
    .bind(price)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn update_price<'e>(db: impl SqliteExecutor<'e>, id: i64, price: f64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE product SET price = ? WHERE id = ?")
        .bind(price)
        .bind(id)
        .execute(db)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(())
}
