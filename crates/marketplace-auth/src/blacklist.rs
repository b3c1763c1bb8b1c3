//! Token revocation list

use chrono::Utc;
use marketplace_db::{NewBlacklistEntry, Repository};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::jwt::Claims;

/// Revoked tokens, keyed by `jti` and kept in the repository until the
/// token would have expired anyway
#[derive(Clone)]
pub struct TokenBlacklist {
    repo: Arc<dyn Repository>,
}

impl TokenBlacklist {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Revoke a token. Revoking twice is a no-op.
    pub async fn add(&self, claims: &Claims) -> Result<(), AuthError> {
        self.repo
            .blacklist_token(NewBlacklistEntry {
                jti: claims.jti.clone(),
                email: claims.sub.clone(),
                expires_at: claims.expires_at(),
            })
            .await?;
        debug!("Blacklisted token {} for {}", claims.jti, claims.sub);
        Ok(())
    }

    pub async fn contains(&self, claims: &Claims) -> Result<bool, AuthError> {
        Ok(self.repo.token_in_blacklist(&claims.jti).await?)
    }

    /// Drop entries whose tokens have expired. Such tokens already fail the
    /// expiry check, so removing them never re-admits anything.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let removed = self.repo.purge_expired_blacklist(Utc::now()).await?;
        if removed > 0 {
            info!("Purged {} expired blacklist entries", removed);
        }
        Ok(removed)
    }
}
