//! Repository capability trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{
    CartItem, NewBlacklistEntry, NewProduct, NewSeller, NewUser, Order, OrderStatus, Product,
    Seller, User,
};
use crate::repository::Database;

/// Storage operations the auth layer and handlers depend on
///
/// Every consistency rule (email uniqueness, single order transition, atomic
/// checkout) is enforced by the implementation, so callers never lock.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Look up a buyer by exact email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Look up a seller by exact email
    async fn find_seller_by_email(&self, email: &str) -> Result<Option<Seller>, DbError>;

    /// Whether the token id has been revoked
    async fn token_in_blacklist(&self, jti: &str) -> Result<bool, DbError>;

    /// Revoke a token id (idempotent)
    async fn blacklist_token(&self, entry: NewBlacklistEntry) -> Result<(), DbError>;

    /// Drop revocations for tokens that expired before `now`
    async fn purge_expired_blacklist(&self, now: DateTime<Utc>) -> Result<u64, DbError>;

    /// Create a buyer; `Duplicate` if the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User, DbError>;

    /// Create a seller; `Duplicate` if the email is taken
    async fn create_seller(&self, seller: NewSeller) -> Result<Seller, DbError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, DbError>;

    async fn list_products(&self) -> Result<Vec<Product>, DbError>;

    async fn get_product(&self, id: i64) -> Result<Option<Product>, DbError>;

    /// Add to the cart, merging quantities for a product already present
    async fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError>;

    /// Replace the quantity of an existing cart line
    async fn edit_cart_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError>;

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<(), DbError>;

    async fn view_cart(&self, user_id: i64) -> Result<Vec<CartItem>, DbError>;

    /// Convert the cart into one placed order per seller
    async fn place_order(&self, user_id: i64) -> Result<Vec<Order>, DbError>;

    async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>, DbError>;

    async fn list_seller_orders(&self, seller_id: i64) -> Result<Vec<Order>, DbError>;

    /// Accept or decline a placed order owned by `seller_id`
    async fn transition_order(
        &self,
        order_id: i64,
        seller_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DbError>;

    /// Wipe accounts, products, carts and orders
    async fn clear_all(&self) -> Result<(), DbError>;
}

#[async_trait]
impl Repository for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_email(email).await
    }

    async fn find_seller_by_email(&self, email: &str) -> Result<Option<Seller>, DbError> {
        self.get_seller_by_email(email).await
    }

    async fn token_in_blacklist(&self, jti: &str) -> Result<bool, DbError> {
        self.is_blacklisted(jti).await
    }

    async fn blacklist_token(&self, entry: NewBlacklistEntry) -> Result<(), DbError> {
        self.insert_blacklist_entry(entry).await
    }

    async fn purge_expired_blacklist(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        self.purge_blacklist_before(now).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DbError> {
        self.insert_user(user).await
    }

    async fn create_seller(&self, seller: NewSeller) -> Result<Seller, DbError> {
        self.insert_seller(seller).await
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, DbError> {
        self.insert_product(product).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        Database::list_products(self).await
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, DbError> {
        self.get_product_by_id(id).await
    }

    async fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError> {
        self.upsert_cart_item(user_id, product_id, quantity).await
    }

    async fn edit_cart_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError> {
        self.update_cart_quantity(user_id, product_id, quantity).await
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> Result<(), DbError> {
        self.delete_cart_item(user_id, product_id).await
    }

    async fn view_cart(&self, user_id: i64) -> Result<Vec<CartItem>, DbError> {
        self.get_cart(user_id).await
    }

    async fn place_order(&self, user_id: i64) -> Result<Vec<Order>, DbError> {
        Database::place_order(self, user_id).await
    }

    async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>, DbError> {
        self.list_orders_for_user(user_id).await
    }

    async fn list_seller_orders(&self, seller_id: i64) -> Result<Vec<Order>, DbError> {
        self.list_orders_for_seller(seller_id).await
    }

    async fn transition_order(
        &self,
        order_id: i64,
        seller_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DbError> {
        Database::transition_order(self, order_id, seller_id, status).await
    }

    async fn clear_all(&self) -> Result<(), DbError> {
        Database::clear_all(self).await
    }
}
