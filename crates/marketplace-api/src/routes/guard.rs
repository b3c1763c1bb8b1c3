//! Authorization middleware and identity extractors
//!
//! `require_buyer` / `require_seller` are installed with `route_layer` on the
//! protected groups. They resolve the caller through the [`AuthGate`] and
//! store the identity in request extensions, where the [`Buyer`] and
//! [`SellerAccount`] extractors pick it up.
//!
//! [`AuthGate`]: marketplace_auth::AuthGate

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use marketplace_auth::{AuthError, AuthenticatedSeller, AuthenticatedUser};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

fn rejected(err: AuthError) -> ApiError {
    if let Some(reason) = err.reason() {
        metrics::counter!("marketplace_auth_rejections_total", "reason" => reason).increment(1);
    }
    err.into()
}

/// Gate for buyer routes
pub async fn require_buyer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state
        .gate
        .authorize_buyer(request.headers())
        .await
        .map_err(rejected)?;

    debug!("{} {} as buyer {}", request.method(), request.uri().path(), auth.user.id);
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Gate for seller routes
pub async fn require_seller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state
        .gate
        .authorize_seller(request.headers())
        .await
        .map_err(rejected)?;

    debug!("{} {} as seller {}", request.method(), request.uri().path(), auth.seller.id);
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Buyer resolved by [`require_buyer`]
pub struct Buyer(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Buyer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Buyer)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// Seller resolved by [`require_seller`]
pub struct SellerAccount(pub AuthenticatedSeller);

impl<S> FromRequestParts<S> for SellerAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedSeller>()
            .cloned()
            .map(SellerAccount)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}
