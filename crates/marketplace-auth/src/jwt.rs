//! JWT token management
//!
//! Access and refresh tokens are HS256-signed JWTs. Both carry the subject
//! email, the principal kind they were issued to and a unique `jti` used
//! for revocation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use marketplace_db::utils::datetime_from_unix;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

/// Who a token was issued to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Seller,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Seller => "seller",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (account email)
    pub sub: String,
    pub kind: PrincipalKind,
    pub class: TokenClass,
    /// Unique token id, the blacklist key
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        datetime_from_unix(self.exp)
    }
}

/// Token settings, built from process configuration at startup
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Access and refresh tokens issued together at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Signs and verifies tokens with a single shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create a new issuer. Fails on an empty secret or when the refresh
    /// lifetime is not strictly longer than the access lifetime.
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        if config.secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }
        if config.access_ttl_secs <= 0 {
            return Err(AuthError::InvalidConfig(
                "access token lifetime must be positive".to_string(),
            ));
        }
        if config.refresh_ttl_secs <= config.access_ttl_secs {
            return Err(AuthError::InvalidConfig(
                "refresh token lifetime must be longer than access token lifetime".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
        })
    }

    pub fn issue_access_token(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.issue(kind, TokenClass::Access, email)
    }

    pub fn issue_refresh_token(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.issue(kind, TokenClass::Refresh, email)
    }

    /// Issue the access/refresh pair handed out at login
    pub fn issue_pair(&self, kind: PrincipalKind, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue_access_token(kind, email)?,
            refresh: self.issue_refresh_token(kind, email)?,
        })
    }

    fn issue(
        &self,
        kind: PrincipalKind,
        class: TokenClass,
        email: &str,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let ttl = match class {
            TokenClass::Access => self.access_ttl,
            TokenClass::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: email.to_string(),
            kind,
            class,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        debug!("Generating {:?} token for {} {}", class, kind, email);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    /// Validate a token's signature, issuer and expiry and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        // A token is dead from its expiry second onwards
        let now = Utc::now().timestamp();
        if token_data.claims.exp <= now {
            return Err(AuthError::ExpiredToken);
        }

        Ok(token_data.claims)
    }

    /// Verify a token and require a specific principal kind and class
    pub fn verify_as(
        &self,
        token: &str,
        kind: PrincipalKind,
        class: TokenClass,
    ) -> Result<Claims, AuthError> {
        let claims = self.verify(token)?;
        if claims.kind != kind || claims.class != class {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            issuer: "marketplace".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
        }
    }

    fn sign(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_at(exp: i64) -> Claims {
        Claims {
            iss: "marketplace".to_string(),
            sub: "a@x.com".to_string(),
            kind: PrincipalKind::User,
            class: TokenClass::Access,
            jti: Uuid::new_v4().to_string(),
            iat: exp - 900,
            exp,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();

        let issued = issuer.issue_access_token(PrincipalKind::Seller, "a@x.com").unwrap();
        let claims = issuer.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.kind, PrincipalKind::Seller);
        assert_eq!(claims.class, TokenClass::Access);
        assert_eq!(claims.jti, issued.claims.jti);
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn test_pair_lifetimes() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();
        let pair = issuer.issue_pair(PrincipalKind::User, "b@x.com").unwrap();

        assert_eq!(pair.access.claims.exp - pair.access.claims.iat, 900);
        assert_eq!(pair.refresh.claims.exp - pair.refresh.claims.iat, 86_400);
        assert_ne!(pair.access.claims.jti, pair.refresh.claims.jti);
        assert_eq!(pair.refresh.claims.class, TokenClass::Refresh);
    }

    #[test]
    fn test_wrong_secret() {
        let a = TokenIssuer::new(&config("secret-one")).unwrap();
        let b = TokenIssuer::new(&config("secret-two")).unwrap();

        let issued = a.issue_access_token(PrincipalKind::User, "a@x.com").unwrap();
        assert!(matches!(b.verify(&issued.token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_malformed_token() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();
        assert!(matches!(issuer.verify("garbage"), Err(AuthError::MalformedToken)));
        assert!(matches!(
            issuer.verify("invalid.token.here"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn test_foreign_issuer_is_malformed() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();
        let mut claims = claims_expiring_at(Utc::now().timestamp() + 600);
        claims.iss = "someone-else".to_string();

        let token = sign("test-secret", &claims);
        assert!(matches!(issuer.verify(&token), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();

        let past = sign("test-secret", &claims_expiring_at(Utc::now().timestamp() - 3600));
        assert!(matches!(issuer.verify(&past), Err(AuthError::ExpiredToken)));

        // Expiry equal to the current second is already expired
        let boundary = sign("test-secret", &claims_expiring_at(Utc::now().timestamp()));
        assert!(matches!(issuer.verify(&boundary), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_verify_as_checks_kind_and_class() {
        let issuer = TokenIssuer::new(&config("test-secret")).unwrap();
        let pair = issuer.issue_pair(PrincipalKind::User, "a@x.com").unwrap();

        assert!(
            issuer
                .verify_as(&pair.access.token, PrincipalKind::User, TokenClass::Access)
                .is_ok()
        );
        assert!(matches!(
            issuer.verify_as(&pair.refresh.token, PrincipalKind::User, TokenClass::Access),
            Err(AuthError::WrongTokenType)
        ));
        assert!(matches!(
            issuer.verify_as(&pair.access.token, PrincipalKind::Seller, TokenClass::Access),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            TokenIssuer::new(&config("")),
            Err(AuthError::MissingSecret)
        ));

        let mut inverted = config("test-secret");
        inverted.refresh_ttl_secs = inverted.access_ttl_secs;
        assert!(matches!(
            TokenIssuer::new(&inverted),
            Err(AuthError::InvalidConfig(_))
        ));

        let mut zero = config("test-secret");
        zero.access_ttl_secs = 0;
        assert!(matches!(TokenIssuer::new(&zero), Err(AuthError::InvalidConfig(_))));
    }
}
