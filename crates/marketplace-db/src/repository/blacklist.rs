//! Token blacklist operations

use chrono::{DateTime, Utc};

use crate::error::DbError;
#[cfg(test)]
use crate::models::BlacklistEntry;
use crate::models::NewBlacklistEntry;
use crate::repository::Database;

impl Database {
    // ==================== Blacklist Operations ====================

    /// Record a revoked token. Re-adding the same `jti` is a no-op.
    pub async fn insert_blacklist_entry(&self, entry: NewBlacklistEntry) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO token_blacklist (jti, email, expires_at, blacklisted_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&entry.jti)
        .bind(&entry.email)
        .bind(entry.expires_at.timestamp())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check whether a token id has been revoked
    pub async fn is_blacklisted(&self, jti: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = ?")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.is_some())
    }

    /// Get a blacklist entry by token id
    #[cfg(test)]
    pub(crate) async fn get_blacklist_entry(
        &self,
        jti: &str,
    ) -> Result<Option<BlacklistEntry>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT jti, email, expires_at, blacklisted_at
            FROM token_blacklist
            WHERE jti = ?
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| BlacklistEntry::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Delete entries whose token expired at or before `now`.
    /// Returns the number of rows removed.
    pub async fn purge_blacklist_before(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::NewBlacklistEntry;
    use crate::repository::test_support::*;

    fn entry(jti: &str, ttl: Duration) -> NewBlacklistEntry {
        NewBlacklistEntry {
            jti: jti.to_string(),
            email: "b@example.com".to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let db = db().await;
        assert!(!db.is_blacklisted("abc").await.unwrap());

        db.insert_blacklist_entry(entry("abc", Duration::minutes(5))).await.unwrap();
        db.insert_blacklist_entry(entry("abc", Duration::minutes(5))).await.unwrap();

        assert!(db.is_blacklisted("abc").await.unwrap());
        let stored = db.get_blacklist_entry("abc").await.unwrap().unwrap();
        assert_eq!(stored.email, "b@example.com");
    }

    #[tokio::test]
    async fn test_purge_keeps_live_entries() {
        let db = db().await;
        db.insert_blacklist_entry(entry("old", Duration::minutes(-5))).await.unwrap();
        db.insert_blacklist_entry(entry("live", Duration::minutes(5))).await.unwrap();

        let removed = db.purge_blacklist_before(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!db.is_blacklisted("old").await.unwrap());
        assert!(db.is_blacklisted("live").await.unwrap());
    }
}
