//! Keyed store of explicitly revoked credentials.
//!
//! Entries are keyed by the SHA-256 hash of the credential string and carry
//! an expiry equal to the credential's own remaining validity (plus a one
//! second buffer), so the store's size is bounded by tokens revoked before
//! their natural expiry, never by the total number issued.

use anyhow::{Result, anyhow};
use sha2::{Digest, Sha256};
use surrealdb::sql::Datetime;
use tracing::{debug, warn};

use crate::auth::credentials::decode_expiry_unverified;
use crate::db::Db;
use crate::db::schema::RevocationRecord;

/// Hash a credential string into the revocation keyspace.
///
/// Raw credentials are never persisted; the unique `jti` inside every
/// issued credential already guarantees distinct hashes per token.
pub fn hash_credential(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// External revocation store backed by the shared database.
pub struct RevocationStore {
    db: Db,
}

impl RevocationStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Revoke a credential for the remainder of its validity.
    ///
    /// The expiry is read without re-verifying the signature: the caller
    /// already authenticated the session being torn down. A credential
    /// that is already expired (or does not decode at all) is dead and the
    /// call is a no-op that creates no entry. Returns whether an entry was
    /// written.
    ///
    /// Safe under concurrent retry: two revocations of the same still-valid
    /// credential compute an equivalent expiry from the same claims, so the
    /// outcome converges regardless of ordering.
    pub async fn add(&self, token: &str) -> Result<bool> {
        let Some(exp) = decode_expiry_unverified(token) else {
            return Ok(false);
        };

        let now = chrono::Utc::now().timestamp();
        // One second of buffer past the credential's own expiry.
        let ttl = exp - now + 1;
        if ttl <= 0 {
            debug!("skipping revocation of already-expired credential");
            return Ok(false);
        }

        let expires_at = chrono::DateTime::from_timestamp(exp + 1, 0)
            .ok_or_else(|| anyhow!("credential expiry out of range: {exp}"))?;

        // Entries self-expire: lookups ignore dead rows, and each write
        // purges whatever has lapsed since the last one.
        self.purge_expired().await?;

        let token_hash = hash_credential(token);
        let mut res = self
            .db
            .query(
                r#"
                CREATE revocation CONTENT {
                    token_hash: $token_hash,
                    expires_at: $expires_at,
                    created_at: time::now()
                }
                "#,
            )
            .bind(("token_hash", token_hash))
            .bind(("expires_at", Datetime::from(expires_at)))
            .await?;

        let created: Vec<RevocationRecord> = res.take(0)?;
        if created.is_empty() {
            return Err(anyhow!("failed to create revocation entry"));
        }
        Ok(true)
    }

    /// Check whether a credential has been revoked.
    ///
    /// **Fails open**: if the store is unreachable the credential is treated
    /// as not revoked. A false negative only re-admits a session that
    /// remains validly signed and unexpired; failing closed would lock out
    /// every user on a single store outage. Preserve this policy.
    pub async fn is_revoked(&self, token: &str) -> bool {
        let token_hash = hash_credential(token);
        let result = self
            .db
            .query(
                r#"
                SELECT * FROM revocation
                WHERE token_hash = $token_hash
                  AND expires_at > time::now()
                LIMIT 1
                "#,
            )
            .bind(("token_hash", token_hash))
            .await
            .and_then(|mut res| res.take::<Vec<RevocationRecord>>(0));

        match result {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                warn!("revocation store unreachable, failing open: {e}");
                false
            }
        }
    }

    /// Number of live (non-expired) revocation entries.
    ///
    /// Operational/test use only; exposed solely on the operator-gated
    /// admin surface.
    pub async fn len(&self) -> Result<u64> {
        let mut res = self
            .db
            .query("SELECT count() FROM revocation WHERE expires_at > time::now() GROUP ALL")
            .await?;

        let row: Option<serde_json::Value> = res.take(0)?;
        Ok(row
            .and_then(|v| v.get("count").and_then(|c| c.as_u64()))
            .unwrap_or(0))
    }

    /// Remove every revocation entry.
    ///
    /// Operational/test use only; this wipes the whole table, so it is
    /// exposed solely on the operator-gated admin surface.
    pub async fn clear(&self) -> Result<()> {
        self.db.query("DELETE revocation").await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<()> {
        self.db
            .query("DELETE revocation WHERE expires_at <= time::now()")
            .await?;
        Ok(())
    }
}
