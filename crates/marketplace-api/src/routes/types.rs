//! Request/Response DTOs

use marketplace_db::{Seller, User};
use serde::{Deserialize, Serialize};

// ==================== Account Types ====================

/// Buyer or seller registration
#[derive(Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Buyer login response
#[derive(Serialize)]
pub struct UserLoginResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Seller login response
#[derive(Serialize)]
pub struct SellerLoginResponse {
    pub seller: Seller,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

// ==================== Catalog Types ====================

/// Create product request
#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

// ==================== Cart Types ====================

fn default_quantity() -> i64 {
    1
}

/// Add to cart request
#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Edit cart request
#[derive(Deserialize)]
pub struct EditCartRequest {
    pub product_id: i64,
    pub quantity: i64,
}
