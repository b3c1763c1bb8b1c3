//! Request authorization
//!
//! The gate resolves a presented token into a live buyer or seller. Every
//! protected request goes through the same steps: extract, verify, check
//! the blacklist, then look the subject up in the repository.

use http::HeaderMap;
use http::header::AUTHORIZATION;
use marketplace_db::{Repository, Seller, User};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::blacklist::TokenBlacklist;
use crate::error::AuthError;
use crate::jwt::{Claims, PrincipalKind, TokenClass, TokenIssuer};

/// Header the login response uses to hand out the access token
pub const ACCESS_TOKEN_HEADER: &str = "access_token";
/// Header the login response uses to hand out the refresh token
pub const REFRESH_TOKEN_HEADER: &str = "refresh_token";

/// Buyer resolved from a valid token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: Claims,
}

/// Seller resolved from a valid token
#[derive(Debug, Clone)]
pub struct AuthenticatedSeller {
    pub seller: Seller,
    pub claims: Claims,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

fn named_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let token = headers.get(name)?.to_str().ok()?.trim();
    (!token.is_empty()).then_some(token)
}

/// Access token from `Authorization: Bearer`, falling back to the
/// `access_token` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    bearer(headers).or_else(|| named_header(headers, ACCESS_TOKEN_HEADER))
}

/// Refresh token from the `refresh_token` header, falling back to
/// `Authorization: Bearer`
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<&str> {
    named_header(headers, REFRESH_TOKEN_HEADER).or_else(|| bearer(headers))
}

#[derive(Clone)]
pub struct AuthGate {
    issuer: Arc<TokenIssuer>,
    blacklist: TokenBlacklist,
    repo: Arc<dyn Repository>,
}

impl AuthGate {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        blacklist: TokenBlacklist,
        repo: Arc<dyn Repository>,
    ) -> Self {
        Self {
            issuer,
            blacklist,
            repo,
        }
    }

    /// Authorize a buyer request from its headers
    pub async fn authorize_buyer(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = extract_bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.resolve_user(token, TokenClass::Access).await
    }

    /// Authorize a seller request from its headers
    pub async fn authorize_seller(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedSeller, AuthError> {
        let token = extract_bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.resolve_seller(token, TokenClass::Access).await
    }

    /// Resolve a buyer from a token of the given class
    pub async fn resolve_user(
        &self,
        token: &str,
        class: TokenClass,
    ) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.check(token, PrincipalKind::User, class).await?;
        let user = self
            .repo
            .find_user_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!("Token subject {} is not a known buyer", claims.sub);
                AuthError::UnknownIdentity
            })?;

        debug!("Authenticated buyer: {} ({})", user.email, user.id);
        Ok(AuthenticatedUser { user, claims })
    }

    /// Resolve a seller from a token of the given class
    pub async fn resolve_seller(
        &self,
        token: &str,
        class: TokenClass,
    ) -> Result<AuthenticatedSeller, AuthError> {
        let claims = self.check(token, PrincipalKind::Seller, class).await?;
        let seller = self
            .repo
            .find_seller_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!("Token subject {} is not a known seller", claims.sub);
                AuthError::UnknownIdentity
            })?;

        debug!("Authenticated seller: {} ({})", seller.email, seller.id);
        Ok(AuthenticatedSeller { seller, claims })
    }

    async fn check(
        &self,
        token: &str,
        kind: PrincipalKind,
        class: TokenClass,
    ) -> Result<Claims, AuthError> {
        let claims = self.issuer.verify_as(token, kind, class).inspect_err(|e| {
            warn!("Rejected {} token: {}", kind, e);
        })?;

        if self.blacklist.contains(&claims).await? {
            warn!("Rejected revoked token {} for {}", claims.jti, claims.sub);
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::tests::config;
    use crate::password::hash_password;
    use http::HeaderValue;
    use marketplace_db::{Database, NewSeller, NewUser};

    struct Fixture {
        gate: AuthGate,
        issuer: Arc<TokenIssuer>,
        blacklist: TokenBlacklist,
        repo: Arc<dyn Repository>,
    }

    async fn fixture() -> Fixture {
        let repo: Arc<dyn Repository> = Arc::new(Database::in_memory().await.unwrap());
        let issuer = Arc::new(TokenIssuer::new(&config("gate-secret")).unwrap());
        let blacklist = TokenBlacklist::new(repo.clone());
        let gate = AuthGate::new(issuer.clone(), blacklist.clone(), repo.clone());

        repo.create_user(NewUser {
            name: "Buyer".to_string(),
            email: "buyer@example.com".to_string(),
            password_hash: hash_password("password123").unwrap(),
        })
        .await
        .unwrap();
        repo.create_seller(NewSeller {
            name: "Seller".to_string(),
            email: "seller@example.com".to_string(),
            password_hash: hash_password("password123").unwrap(),
        })
        .await
        .unwrap();

        Fixture {
            gate,
            issuer,
            blacklist,
            repo,
        }
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_extract_tokens() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(extract_bearer_token(&headers), Some("from-header"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_bearer_token(&headers), Some("from-bearer"));

        headers.insert(REFRESH_TOKEN_HEADER, HeaderValue::from_static("refresh"));
        assert_eq!(extract_refresh_token(&headers), Some("refresh"));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer_token(&basic).is_none());
    }

    #[tokio::test]
    async fn test_buyer_flow() {
        let f = fixture().await;
        let pair = f.issuer.issue_pair(PrincipalKind::User, "buyer@example.com").unwrap();

        let auth = f.gate.authorize_buyer(&bearer_headers(&pair.access.token)).await.unwrap();
        assert_eq!(auth.user.email, "buyer@example.com");

        let err = f.gate.authorize_buyer(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.reason(), Some("no_token"));

        let err = f
            .gate
            .authorize_buyer(&bearer_headers(&pair.refresh.token))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some("invalid"));

        let refreshed = f.gate.resolve_user(&pair.refresh.token, TokenClass::Refresh).await.unwrap();
        assert_eq!(refreshed.user.email, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_seller_token_rejected_by_buyer_gate() {
        let f = fixture().await;
        let seller_token = f
            .issuer
            .issue_access_token(PrincipalKind::Seller, "seller@example.com")
            .unwrap();

        let err = f
            .gate
            .authorize_buyer(&bearer_headers(&seller_token.token))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some("invalid"));

        let ok = f
            .gate
            .authorize_seller(&bearer_headers(&seller_token.token))
            .await
            .unwrap();
        assert_eq!(ok.seller.email, "seller@example.com");
    }

    #[tokio::test]
    async fn test_revoked_token() {
        let f = fixture().await;
        let token = f
            .issuer
            .issue_access_token(PrincipalKind::User, "buyer@example.com")
            .unwrap();
        let headers = bearer_headers(&token.token);

        assert!(f.gate.authorize_buyer(&headers).await.is_ok());

        f.blacklist.add(&token.claims).await.unwrap();
        // Signature and expiry still pass on their own
        assert!(f.issuer.verify(&token.token).is_ok());

        let err = f.gate.authorize_buyer(&headers).await.unwrap_err();
        assert_eq!(err.reason(), Some("revoked"));
    }

    #[tokio::test]
    async fn test_unknown_identity() {
        let f = fixture().await;
        let token = f
            .issuer
            .issue_access_token(PrincipalKind::User, "ghost@example.com")
            .unwrap();

        let err = f.gate.authorize_buyer(&bearer_headers(&token.token)).await.unwrap_err();
        assert_eq!(err.reason(), Some("unknown_identity"));

        f.repo.clear_all().await.unwrap();
        let token = f
            .issuer
            .issue_access_token(PrincipalKind::User, "buyer@example.com")
            .unwrap();
        let err = f.gate.authorize_buyer(&bearer_headers(&token.token)).await.unwrap_err();
        assert_eq!(err.reason(), Some("unknown_identity"));
    }

    #[tokio::test]
    async fn test_foreign_secret_is_invalid() {
        let f = fixture().await;
        let other = TokenIssuer::new(&config("other-secret")).unwrap();
        let token = other
            .issue_access_token(PrincipalKind::User, "buyer@example.com")
            .unwrap();

        let err = f.gate.authorize_buyer(&bearer_headers(&token.token)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
        assert_eq!(err.reason(), Some("invalid"));
    }
}
