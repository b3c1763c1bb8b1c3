//! Database models

use crate::utils::{datetime_from_unix, parse_datetime_or_now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidOrderStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidOrderStatus(s) => write!(f, "Invalid order status: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Order status
///
/// Orders start as `Placed`; a seller moves them to `Accepted` or `Declined`
/// exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Declined,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Declined => "declined",
        }
    }

    /// Whether a seller may still accept or decline the order
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }
}

impl FromStr for OrderStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(OrderStatus::Placed),
            "accepted" => Ok(OrderStatus::Accepted),
            "declined" => Ok(OrderStatus::Declined),
            _ => Err(ParseError::InvalidOrderStatus(s.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Seller account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// New buyer (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// New seller (for insertion)
#[derive(Debug, Clone)]
pub struct NewSeller {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Catalog item owned by a single seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// New product (for insertion)
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Largest quantity a single cart line may hold, including merged adds
pub const MAX_CART_QUANTITY: i64 = 10_000;

/// A line in a buyer's cart, joined with the product it points at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line; name, price and seller are captured when the order is placed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub seller_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total: f64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// True when every line of the order belongs to `seller_id`
    pub fn is_owned_by(&self, seller_id: i64) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.seller_id == seller_id)
    }
}

/// Revoked token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub jti: String,
    pub email: String,
    /// Expiry of the revoked token itself; the entry can be reaped after this
    pub expires_at: DateTime<Utc>,
    pub blacklisted_at: DateTime<Utc>,
}

/// New blacklist entry (for insertion)
#[derive(Debug, Clone)]
pub struct NewBlacklistEntry {
    pub jti: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Seller {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Seller {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Product {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.try_get("id")?,
            seller_id: row.try_get("seller_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CartItem {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CartItem {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for OrderItem {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            product_id: row.try_get("product_id")?,
            seller_id: row.try_get("seller_id")?,
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
        })
    }
}

/// Items are loaded separately and start out empty
impl TryFrom<&sqlx::sqlite::SqliteRow> for Order {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status_str).map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: Box::new(e),
        })?;
        Ok(Order {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status,
            total: row.try_get("total")?,
            items: Vec::new(),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for BlacklistEntry {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(BlacklistEntry {
            jti: row.try_get("jti")?,
            email: row.try_get("email")?,
            expires_at: datetime_from_unix(row.try_get("expires_at")?),
            blacklisted_at: parse_datetime_or_now(&row.try_get::<String, _>("blacklisted_at")?),
        })
    }
}
