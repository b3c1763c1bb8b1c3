//! Cart operations

use chrono::Utc;

use crate::error::DbError;
use crate::models::{CartItem, MAX_CART_QUANTITY};
use crate::repository::Database;

fn check_quantity(quantity: i64) -> Result<(), DbError> {
    if quantity < 1 {
        return Err(DbError::InvalidInput("Quantity must be at least 1".to_string()));
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(DbError::InvalidInput(format!(
            "Quantity must not exceed {}",
            MAX_CART_QUANTITY
        )));
    }
    Ok(())
}

const CART_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.product_id, p.name AS product_name, p.price AS unit_price,
           c.quantity, c.created_at, c.updated_at
    FROM cart_items c
    JOIN products p ON p.id = c.product_id
"#;

impl Database {
    // ==================== Cart Operations ====================

    /// Add `quantity` of a product to a buyer's cart, merging with an
    /// existing line for the same product. A merge that would push the line
    /// past [`MAX_CART_QUANTITY`] leaves it unchanged and fails.
    pub async fn upsert_cart_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError> {
        check_quantity(quantity)?;
        if self.get_product_by_id(product_id).await?.is_none() {
            return Err(DbError::NotFound(format!("Product {}", product_id)));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, product_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at
            WHERE cart_items.quantity <= ? - excluded.quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(&now)
        .bind(&now)
        .bind(MAX_CART_QUANTITY)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InvalidInput(format!(
                "Cart quantity for product {} would exceed {}",
                product_id, MAX_CART_QUANTITY
            )));
        }

        self.get_cart_item(user_id, product_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Product {}", product_id)))
    }

    /// Replace the quantity of an existing cart line
    pub async fn update_cart_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError> {
        check_quantity(quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = ?, updated_at = ?
            WHERE user_id = ? AND product_id = ?
            "#,
        )
        .bind(quantity)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Cart item for product {}", product_id)));
        }

        self.get_cart_item(user_id, product_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Cart item for product {}", product_id)))
    }

    /// Remove a product from a buyer's cart
    pub async fn delete_cart_item(&self, user_id: i64, product_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Cart item for product {}", product_id)));
        }
        Ok(())
    }

    /// Get a single cart line
    pub async fn get_cart_item(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<CartItem>, DbError> {
        let sql = format!("{CART_SELECT} WHERE c.user_id = ? AND c.product_id = ?");
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| CartItem::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List a buyer's cart in the order lines were added
    pub async fn get_cart(&self, user_id: i64) -> Result<Vec<CartItem>, DbError> {
        let sql = format!("{CART_SELECT} WHERE c.user_id = ? ORDER BY c.id");
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| CartItem::try_from(row).map_err(DbError::from))
            .collect()
    }
}
