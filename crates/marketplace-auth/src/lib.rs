//! Marketplace authentication and authorization
//!
//! Password hashing, signed access/refresh tokens, a persistent token
//! blacklist and the gate that turns a request's headers into a resolved
//! buyer or seller identity.

pub mod blacklist;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod password;

pub use blacklist::TokenBlacklist;
pub use error::AuthError;
pub use gate::{
    ACCESS_TOKEN_HEADER, AuthGate, AuthenticatedSeller, AuthenticatedUser, REFRESH_TOKEN_HEADER,
    extract_bearer_token, extract_refresh_token,
};
pub use jwt::{Claims, IssuedToken, JwtConfig, PrincipalKind, TokenClass, TokenIssuer, TokenPair};
pub use password::{hash_password, verify_password};
