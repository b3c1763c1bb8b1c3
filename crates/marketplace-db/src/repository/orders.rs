//! Order operations

use chrono::Utc;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::DbError;
use crate::models::{Order, OrderItem, OrderStatus};
use crate::repository::Database;
use crate::utils::round_money;

impl Database {
    // ==================== Order Operations ====================

    /// Turn a buyer's cart into orders, one per seller, and empty the cart.
    ///
    /// Runs in a single transaction; either every order is created and the
    /// cart cleared, or nothing changes.
    pub async fn place_order(&self, user_id: i64) -> Result<Vec<Order>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT c.product_id, c.quantity, p.seller_id, p.name, p.price
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Err(DbError::InvalidInput("Cart is empty".to_string()));
        }

        let mut by_seller: BTreeMap<i64, Vec<OrderItem>> = BTreeMap::new();
        for row in &rows {
            let item = OrderItem {
                product_id: row.try_get("product_id")?,
                seller_id: row.try_get("seller_id")?,
                product_name: row.try_get("name")?,
                quantity: row.try_get("quantity")?,
                unit_price: row.try_get("price")?,
            };
            by_seller.entry(item.seller_id).or_default().push(item);
        }

        let now = Utc::now();
        let mut orders = Vec::with_capacity(by_seller.len());
        for (_, items) in by_seller {
            let total = round_money(
                items
                    .iter()
                    .map(|item| item.unit_price * item.quantity as f64)
                    .sum(),
            );

            let result = sqlx::query(
                r#"
                INSERT INTO orders (user_id, status, total, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(OrderStatus::Placed.as_str())
            .bind(total)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .fetch_one(&mut *tx)
            .await?;
            let order_id: i64 = result.get("id");

            for item in &items {
                sqlx::query(
                    r#"
                    INSERT INTO order_items (order_id, product_id, seller_id, product_name, quantity, unit_price)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(order_id)
                .bind(item.product_id)
                .bind(item.seller_id)
                .bind(&item.product_name)
                .bind(item.quantity)
                .bind(item.unit_price)
                .execute(&mut *tx)
                .await?;
            }

            orders.push(Order {
                id: order_id,
                user_id,
                status: OrderStatus::Placed,
                total,
                items,
                created_at: now,
                updated_at: now,
            });
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id, orders = orders.len(), "Placed orders from cart");
        Ok(orders)
    }

    /// Get an order with its line items
    pub async fn get_order_by_id(&self, id: i64) -> Result<Option<Order>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, status, total, created_at, updated_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => {
                let mut order = Order::try_from(&row)?;
                order.items = self.get_order_items(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// List a buyer's orders, newest first
    pub async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, total, created_at, updated_at
            FROM orders
            WHERE user_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.orders_with_items(&rows).await
    }

    /// List orders containing a seller's products, newest first
    pub async fn list_orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, total, created_at, updated_at
            FROM orders
            WHERE id IN (SELECT order_id FROM order_items WHERE seller_id = ?)
            ORDER BY id DESC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        self.orders_with_items(&rows).await
    }

    /// Move a placed order to `status` on behalf of `seller_id`.
    ///
    /// The update only matches when the order is still placed and every line
    /// belongs to the seller. When nothing matches, the order is re-read to
    /// report why.
    pub async fn transition_order(
        &self,
        order_id: i64,
        seller_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DbError> {
        if status.is_open() {
            return Err(DbError::InvalidInput(format!(
                "Cannot move an order back to '{}'",
                status
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, updated_at = ?
            WHERE id = ?
              AND status = 'placed'
              AND EXISTS (SELECT 1 FROM order_items WHERE order_id = orders.id)
              AND NOT EXISTS (
                  SELECT 1 FROM order_items
                  WHERE order_id = orders.id AND seller_id != ?
              )
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(order_id)
        .bind(seller_id)
        .execute(&self.pool)
        .await?;

        let order = self
            .get_order_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Order {}", order_id)))?;

        if result.rows_affected() > 0 {
            info!(order_id, seller_id, status = %status, "Order transitioned");
            return Ok(order);
        }

        if !order.is_owned_by(seller_id) {
            debug!(order_id, seller_id, "Order belongs to another seller");
            return Err(DbError::Forbidden(format!("Order {}", order_id)));
        }
        Err(DbError::Conflict(format!(
            "Order {} is already {}",
            order_id, order.status
        )))
    }

    async fn get_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, seller_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = ?
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| OrderItem::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn orders_with_items(
        &self,
        rows: &[sqlx::sqlite::SqliteRow],
    ) -> Result<Vec<Order>, DbError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = Order::try_from(row)?;
            order.items = self.get_order_items(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::models::OrderStatus;
    use crate::repository::test_support::*;

    #[tokio::test]
    async fn test_place_order_splits_by_seller() {
        let db = db().await;
        let buyer = user(&db, "b@example.com").await;
        let acme = seller(&db, "acme@example.com").await;
        let globex = seller(&db, "globex@example.com").await;
        let lamp = product(&db, acme.id, "Lamp", 10.0).await;
        let desk = product(&db, acme.id, "Desk", 0.1).await;
        let chair = product(&db, globex.id, "Chair", 45.5).await;

        db.upsert_cart_item(buyer.id, lamp.id, 2).await.unwrap();
        db.upsert_cart_item(buyer.id, desk.id, 3).await.unwrap();
        db.upsert_cart_item(buyer.id, chair.id, 1).await.unwrap();

        let orders = db.place_order(buyer.id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Placed));

        let acme_order = orders.iter().find(|o| o.is_owned_by(acme.id)).unwrap();
        assert_eq!(acme_order.items.len(), 2);
        assert_eq!(acme_order.total, 20.3);

        assert!(db.get_cart(buyer.id).await.unwrap().is_empty());

        let listed = db.list_orders_for_user(buyer.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|o| o.status == OrderStatus::Placed));

        let for_globex = db.list_orders_for_seller(globex.id).await.unwrap();
        assert_eq!(for_globex.len(), 1);
        assert_eq!(for_globex[0].items[0].product_name, "Chair");
    }

    #[tokio::test]
    async fn test_place_order_with_empty_cart() {
        let db = db().await;
        let buyer = user(&db, "b@example.com").await;

        let err = db.place_order(buyer.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
        assert!(db.list_orders_for_user(buyer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transition_rules() {
        let db = db().await;
        let buyer = user(&db, "b@example.com").await;
        let owner = seller(&db, "a@x.com").await;
        let other = seller(&db, "b@x.com").await;
        let lamp = product(&db, owner.id, "Lamp", 10.0).await;

        db.upsert_cart_item(buyer.id, lamp.id, 1).await.unwrap();
        let order_id = db.place_order(buyer.id).await.unwrap()[0].id;

        let err = db
            .transition_order(order_id, other.id, OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Forbidden(_)));
        let unchanged = db.get_order_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, OrderStatus::Placed);

        let accepted = db
            .transition_order(order_id, owner.id, OrderStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);

        let err = db
            .transition_order(order_id, owner.id, OrderStatus::Declined)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        let still = db.get_order_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(still.status, OrderStatus::Accepted);

        let err = db
            .transition_order(9999, owner.id, OrderStatus::Declined)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));

        let err = db
            .transition_order(order_id, owner.id, OrderStatus::Placed)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
    }
}
