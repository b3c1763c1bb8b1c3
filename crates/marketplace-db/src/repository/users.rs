//! Buyer and seller account operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewSeller, NewUser, Seller, User};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new buyer. The UNIQUE constraint on `email` rejects duplicates,
    /// including ones racing in from concurrent requests.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_insert(e, || format!("User '{}' already exists", user.email)))?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
        })
    }

    /// Get a buyer by email (exact match)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    // ==================== Seller Operations ====================

    /// Insert a new seller
    pub async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sellers (name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&seller.name)
        .bind(&seller.email)
        .bind(&seller.password_hash)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_insert(e, || format!("Seller '{}' already exists", seller.email)))?;

        let id: i64 = result.get("id");

        Ok(Seller {
            id,
            name: seller.name,
            email: seller.email,
            password_hash: seller.password_hash,
            created_at: now,
        })
    }

    /// Get a seller by email (exact match)
    pub async fn get_seller_by_email(&self, email: &str) -> Result<Option<Seller>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM sellers
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Seller::try_from(&row).map_err(DbError::from)).transpose()
    }
}
