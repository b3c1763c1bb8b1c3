//! API routes

mod cart;
pub mod guard;
mod health;
pub mod metrics;
mod orders;
mod products;
mod sellers;
pub mod types;
mod users;
mod validation;

use axum::{
    Router,
    http::{HeaderName, Method, Uri, header},
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

/// Routes open to anyone
fn public_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .route("/user/create", post(users::create_user))
        .route("/user/login", post(users::login_user))
        .route("/user/refresh", post(users::refresh_user))
        .route("/seller/create", post(sellers::create_seller))
        .route("/seller/login", post(sellers::login_seller))
        .route("/seller/refresh", post(sellers::refresh_seller))
        .route("/seller/clear", delete(sellers::clear_all))
}

/// Routes behind the buyer gate
fn buyer_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/user/logout", post(users::logout_user))
        .route("/user/product/all", get(products::list_products))
        .route("/user/product/{id}", get(products::get_product))
        .route("/user/cart/add", post(cart::add_to_cart))
        .route("/user/cart/edit", put(cart::edit_cart))
        .route("/user/cart/delete/{id}", delete(cart::delete_from_cart))
        .route("/user/cart/view", get(cart::view_cart))
        .route("/user/order/view", get(orders::view_orders))
        .route("/user/placeorder", post(orders::place_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_buyer,
        ))
}

/// Routes behind the seller gate
fn seller_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/seller/logout", post(sellers::logout_seller))
        .route("/seller/product/add", post(products::create_product))
        .route("/seller/orders/list", get(orders::list_orders))
        .route("/seller/order/accept/{id}", patch(orders::accept_order))
        .route("/seller/order/decline/{id}", patch(orders::decline_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_seller,
        ))
}

/// Unknown routes still answer with the envelope
async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Permissive CORS: any origin and header, the five methods the API uses
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_LENGTH,
            HeaderName::from_static(marketplace_auth::ACCESS_TOKEN_HEADER),
            HeaderName::from_static(marketplace_auth::REFRESH_TOKEN_HEADER),
        ])
        .max_age(Duration::from_secs(12 * 3600))
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(buyer_routes(&state))
        .merge(seller_routes(&state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.layer(cors_layer())
}
