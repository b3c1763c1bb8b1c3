//! Product catalog routes

use axum::extract::State;
use marketplace_db::{NewProduct, Product};
use tracing::info;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

use super::guard::SellerAccount;
use super::types::CreateProductRequest;
use super::validation::{validate_name, validate_price};

/// GET /user/product/all
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Product>>, ApiError> {
    let products = state.repo.list_products().await?;
    Ok(ApiResponse::ok("Products retrieved", products))
}

/// GET /user/product/{id}
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state
        .repo
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))?;

    Ok(ApiResponse::ok("Product retrieved", product))
}

/// POST /seller/product/add
pub async fn create_product(
    State(state): State<AppState>,
    SellerAccount(auth): SellerAccount,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<ApiResponse<Product>, ApiError> {
    let name = validate_name(&request.name, "Product name", true)?;
    validate_price(request.price)?;

    let product = state
        .repo
        .create_product(NewProduct {
            seller_id: auth.seller.id,
            name,
            description: request.description.trim().to_string(),
            price: request.price,
        })
        .await?;

    info!("Seller {} created product {}", auth.seller.id, product.id);

    Ok(ApiResponse::ok("Product created", product))
}
