//! Cart routes

use axum::extract::State;
use marketplace_db::CartItem;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

use super::guard::Buyer;
use super::types::{AddToCartRequest, EditCartRequest};
use super::validation::validate_quantity;

/// POST /user/cart/add
pub async fn add_to_cart(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
    ApiJson(request): ApiJson<AddToCartRequest>,
) -> Result<ApiResponse<CartItem>, ApiError> {
    validate_quantity(request.quantity)?;

    let item = state
        .repo
        .add_to_cart(auth.user.id, request.product_id, request.quantity)
        .await?;

    debug!(
        "Buyer {} added {} x product {}",
        auth.user.id, request.quantity, request.product_id
    );

    Ok(ApiResponse::ok("Product added to cart", item))
}

/// PUT /user/cart/edit
pub async fn edit_cart(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
    ApiJson(request): ApiJson<EditCartRequest>,
) -> Result<ApiResponse<CartItem>, ApiError> {
    validate_quantity(request.quantity)?;

    let item = state
        .repo
        .edit_cart_item(auth.user.id, request.product_id, request.quantity)
        .await?;

    Ok(ApiResponse::ok("Cart updated", item))
}

/// DELETE /user/cart/delete/{id}
///
/// `id` is the product id of the cart line.
pub async fn delete_from_cart(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<ApiResponse, ApiError> {
    state.repo.remove_from_cart(auth.user.id, product_id).await?;
    Ok(ApiResponse::message("Product removed from cart"))
}

/// GET /user/cart/view
pub async fn view_cart(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
) -> Result<ApiResponse<Vec<CartItem>>, ApiError> {
    let items = state.repo.view_cart(auth.user.id).await?;
    Ok(ApiResponse::ok("Cart retrieved", items))
}
