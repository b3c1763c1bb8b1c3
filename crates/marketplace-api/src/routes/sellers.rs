//! Seller account routes

use axum::extract::State;
use axum::http::HeaderMap;
use marketplace_auth::{
    ACCESS_TOKEN_HEADER, AuthError, PrincipalKind, REFRESH_TOKEN_HEADER, TokenClass,
    extract_refresh_token, hash_password, verify_password,
};
use marketplace_db::{NewSeller, Seller};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::guard::SellerAccount;
use super::types::{CreateAccountRequest, LoginRequest, RefreshResponse, SellerLoginResponse};
use super::users::revoke_session;
use super::validation::{login_credentials, normalize_email, validate_name, validate_password};

/// POST /seller/create
pub async fn create_seller(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<ApiResponse<Seller>, ApiError> {
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;
    let name = validate_name(&request.name, "Name", false)?;

    debug!("Creating seller: {}", email);

    let password_hash = hash_password(&request.password)?;
    let seller = state
        .repo
        .create_seller(NewSeller {
            name,
            email,
            password_hash,
        })
        .await?;

    info!("Created seller: {} ({})", seller.email, seller.id);
    metrics::counter!("marketplace_accounts_created_total", "kind" => "seller").increment(1);

    Ok(ApiResponse::ok("Seller created", seller))
}

/// POST /seller/login
pub async fn login_seller(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiResponse<SellerLoginResponse>, ApiError> {
    let (email, password) = login_credentials(&request.email, &request.password)?;

    debug!("Login attempt for seller: {}", email);

    let seller = state
        .repo
        .find_seller_by_email(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email does not exist".to_string()))?;

    if !verify_password(password, &seller.password_hash)? {
        warn!("Invalid password for seller {}", email);
        return Err(ApiError::unauthorized("invalid_credentials", "Invalid password"));
    }

    let pair = state.tokens.issue_pair(PrincipalKind::Seller, &seller.email)?;

    info!("Seller {} logged in successfully", seller.email);
    metrics::counter!("marketplace_logins_total", "kind" => "seller").increment(1);

    Ok(ApiResponse::ok(
        "Login successful",
        SellerLoginResponse {
            seller,
            access_token: pair.access.token.clone(),
            refresh_token: pair.refresh.token.clone(),
        },
    )
    .with_header(ACCESS_TOKEN_HEADER, &pair.access.token)
    .with_header(REFRESH_TOKEN_HEADER, &pair.refresh.token))
}

/// POST /seller/refresh
pub async fn refresh_seller(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiResponse<RefreshResponse>, ApiError> {
    let token = extract_refresh_token(&headers).ok_or(AuthError::MissingToken)?;
    let auth = state.gate.resolve_seller(token, TokenClass::Refresh).await?;

    let access = state
        .tokens
        .issue_access_token(PrincipalKind::Seller, &auth.seller.email)?;

    debug!("Refreshed access token for seller {}", auth.seller.email);

    Ok(ApiResponse::ok(
        "Token refreshed",
        RefreshResponse {
            access_token: access.token.clone(),
        },
    )
    .with_header(ACCESS_TOKEN_HEADER, &access.token))
}

/// POST /seller/logout
pub async fn logout_seller(
    State(state): State<AppState>,
    SellerAccount(auth): SellerAccount,
    headers: HeaderMap,
) -> Result<ApiResponse, ApiError> {
    revoke_session(&state, &auth.claims, &headers, PrincipalKind::Seller).await?;
    info!("Seller {} logged out", auth.seller.email);
    Ok(ApiResponse::message("Logout successful"))
}

/// DELETE /seller/clear
///
/// Wipes every account, product, cart and order. Only served when the
/// database is configured with `allow_clear`.
pub async fn clear_all(State(state): State<AppState>) -> Result<ApiResponse, ApiError> {
    if !state.allow_clear {
        warn!("Refused to clear database: clearing is disabled");
        return Err(ApiError::Forbidden("Clearing the database is disabled".to_string()));
    }

    state.repo.clear_all().await?;
    warn!("All marketplace data cleared");

    Ok(ApiResponse::message("All data cleared"))
}
