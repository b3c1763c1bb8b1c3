//! Product catalog operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewProduct, Product};
use crate::repository::Database;

impl Database {
    // ==================== Product Operations ====================

    /// Insert a product owned by `product.seller_id`
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (seller_id, name, description, price, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(product.seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Product {
            id,
            seller_id: product.seller_id,
            name: product.name,
            description: product.description,
            price: product.price,
            created_at: now,
        })
    }

    /// List all products, oldest first
    pub async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, seller_id, name, description, price, created_at
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Product::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a product by ID
    pub async fn get_product_by_id(&self, id: i64) -> Result<Option<Product>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, seller_id, name, description, price, created_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Product::try_from(&row).map_err(DbError::from)).transpose()
    }
}
