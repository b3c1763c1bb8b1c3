//! Order routes for buyers and sellers

use axum::extract::State;
use marketplace_db::{Order, OrderStatus};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::guard::{Buyer, SellerAccount};

// ==================== Buyer Routes ====================

/// GET /user/order/view
pub async fn view_orders(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders = state.repo.list_user_orders(auth.user.id).await?;
    Ok(ApiResponse::ok("Orders retrieved", orders))
}

/// POST /user/placeorder
pub async fn place_order(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders = state.repo.place_order(auth.user.id).await?;

    info!("Buyer {} placed {} order(s)", auth.user.id, orders.len());
    metrics::counter!("marketplace_orders_placed_total").increment(orders.len() as u64);

    Ok(ApiResponse::ok("Order placed", orders))
}

// ==================== Seller Routes ====================

/// GET /seller/orders/list
pub async fn list_orders(
    State(state): State<AppState>,
    SellerAccount(auth): SellerAccount,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders = state.repo.list_seller_orders(auth.seller.id).await?;
    Ok(ApiResponse::ok("Orders retrieved", orders))
}

/// PATCH /seller/order/accept/{id}
pub async fn accept_order(
    State(state): State<AppState>,
    SellerAccount(auth): SellerAccount,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Order>, ApiError> {
    transition(&state, auth.seller.id, id, OrderStatus::Accepted).await
}

/// PATCH /seller/order/decline/{id}
pub async fn decline_order(
    State(state): State<AppState>,
    SellerAccount(auth): SellerAccount,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Order>, ApiError> {
    transition(&state, auth.seller.id, id, OrderStatus::Declined).await
}

async fn transition(
    state: &AppState,
    seller_id: i64,
    order_id: i64,
    status: OrderStatus,
) -> Result<ApiResponse<Order>, ApiError> {
    let order = state
        .repo
        .transition_order(order_id, seller_id, status)
        .await
        .inspect_err(|e| {
            warn!(
                "Seller {} could not move order {} to {}: {}",
                seller_id, order_id, status, e
            );
        })?;

    metrics::counter!("marketplace_order_transitions_total", "status" => status.as_str())
        .increment(1);

    Ok(ApiResponse::ok(format!("Order {}", status), order))
}
