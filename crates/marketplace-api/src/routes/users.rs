//! Buyer account routes

use axum::extract::State;
use axum::http::HeaderMap;
use marketplace_auth::{
    ACCESS_TOKEN_HEADER, AuthError, Claims, PrincipalKind, REFRESH_TOKEN_HEADER, TokenClass,
    extract_refresh_token, hash_password, verify_password,
};
use marketplace_db::{NewUser, User};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::guard::Buyer;
use super::types::{CreateAccountRequest, LoginRequest, RefreshResponse, UserLoginResponse};
use super::validation::{login_credentials, normalize_email, validate_name, validate_password};

/// POST /user/create
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;
    let name = validate_name(&request.name, "Name", false)?;

    debug!("Creating buyer: {}", email);

    let password_hash = hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    info!("Created buyer: {} ({})", user.email, user.id);
    metrics::counter!("marketplace_accounts_created_total", "kind" => "user").increment(1);

    Ok(ApiResponse::ok("User created", user))
}

/// POST /user/login
pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiResponse<UserLoginResponse>, ApiError> {
    let (email, password) = login_credentials(&request.email, &request.password)?;

    debug!("Login attempt for buyer: {}", email);

    let user = state
        .repo
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email does not exist".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        warn!("Invalid password for buyer {}", email);
        return Err(ApiError::unauthorized("invalid_credentials", "Invalid password"));
    }

    let pair = state.tokens.issue_pair(PrincipalKind::User, &user.email)?;

    info!("Buyer {} logged in successfully", user.email);
    metrics::counter!("marketplace_logins_total", "kind" => "user").increment(1);

    Ok(ApiResponse::ok(
        "Login successful",
        UserLoginResponse {
            user,
            access_token: pair.access.token.clone(),
            refresh_token: pair.refresh.token.clone(),
        },
    )
    .with_header(ACCESS_TOKEN_HEADER, &pair.access.token)
    .with_header(REFRESH_TOKEN_HEADER, &pair.refresh.token))
}

/// POST /user/refresh
pub async fn refresh_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiResponse<RefreshResponse>, ApiError> {
    let token = extract_refresh_token(&headers).ok_or(AuthError::MissingToken)?;
    let auth = state.gate.resolve_user(token, TokenClass::Refresh).await?;

    let access = state
        .tokens
        .issue_access_token(PrincipalKind::User, &auth.user.email)?;

    debug!("Refreshed access token for buyer {}", auth.user.email);

    Ok(ApiResponse::ok(
        "Token refreshed",
        RefreshResponse {
            access_token: access.token.clone(),
        },
    )
    .with_header(ACCESS_TOKEN_HEADER, &access.token))
}

/// POST /user/logout
pub async fn logout_user(
    State(state): State<AppState>,
    Buyer(auth): Buyer,
    headers: HeaderMap,
) -> Result<ApiResponse, ApiError> {
    revoke_session(&state, &auth.claims, &headers, PrincipalKind::User).await?;
    info!("Buyer {} logged out", auth.user.email);
    Ok(ApiResponse::message("Logout successful"))
}

/// Blacklist the access token a request was authorized with, plus the
/// refresh token from the `refresh_token` header when it is a valid one
/// for the same account.
pub(super) async fn revoke_session(
    state: &AppState,
    access: &Claims,
    headers: &HeaderMap,
    kind: PrincipalKind,
) -> Result<(), ApiError> {
    state.blacklist.add(access).await?;

    let refresh = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = refresh {
        match state.tokens.verify_as(token, kind, TokenClass::Refresh) {
            Ok(claims) if claims.sub == access.sub => state.blacklist.add(&claims).await?,
            Ok(_) => warn!("Ignoring refresh token for another account on logout"),
            Err(e) => debug!("Ignoring refresh token on logout: {}", e),
        }
    }
    Ok(())
}
