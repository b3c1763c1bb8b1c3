//! Authentication error types

use marketplace_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Malformed token")]
    MalformedToken,

    /// Well-formed and signed, but the wrong class or principal kind
    #[error("Token not valid for this route")]
    WrongTokenType,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token subject no longer exists")]
    UnknownIdentity,

    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl AuthError {
    /// Reason code reported to clients for a rejected credential, or `None`
    /// when the error is a server-side failure.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AuthError::MissingToken => Some("no_token"),
            AuthError::InvalidSignature
            | AuthError::MalformedToken
            | AuthError::WrongTokenType => Some("invalid"),
            AuthError::ExpiredToken => Some("expired"),
            AuthError::RevokedToken => Some("revoked"),
            AuthError::UnknownIdentity => Some("unknown_identity"),
            AuthError::MissingSecret
            | AuthError::InvalidConfig(_)
            | AuthError::PasswordHash(_)
            | AuthError::Signing(_)
            | AuthError::Storage(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.reason().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(AuthError::MissingToken.reason(), Some("no_token"));
        assert_eq!(AuthError::InvalidSignature.reason(), Some("invalid"));
        assert_eq!(AuthError::WrongTokenType.reason(), Some("invalid"));
        assert_eq!(AuthError::ExpiredToken.reason(), Some("expired"));
        assert_eq!(AuthError::RevokedToken.reason(), Some("revoked"));
        assert_eq!(AuthError::UnknownIdentity.reason(), Some("unknown_identity"));
        assert!(!AuthError::PasswordHash("oom".to_string()).is_unauthorized());
        assert!(!AuthError::Storage(DbError::NotFound("x".to_string())).is_unauthorized());
    }
}
