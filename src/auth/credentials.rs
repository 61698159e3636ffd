//! Credential issuing and verification.

use anyhow::Result;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::RecordId;
use uuid::Uuid;

use crate::db::schema::record_key;
use crate::error::AuthenticationError;
use crate::types::TokenId;

/// Fixed credential lifetime. Credentials are immutable once issued and
/// there is no refresh or rotation; a new login mints a new credential.
pub const CREDENTIAL_TTL_DAYS: i64 = 7;

/// Claims embedded in every issued credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal record key (subject)
    pub sub: String,
    /// Unique token id, freshly generated per credential
    pub jti: TokenId,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, always `iat` + the fixed window
    pub exp: i64,
}

/// Mints and verifies signed credentials (HS256, shared secret).
///
/// Stateless: the only failure mode on the issuing side is the signing
/// infrastructure itself.
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl CredentialIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a credential for a principal.
    ///
    /// The fresh v4 `jti` guarantees two credentials never collide in the
    /// revocation keyspace, even for the same principal in the same second.
    pub fn issue(&self, principal_id: &RecordId) -> Result<String> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: record_key(principal_id),
            jti: TokenId::new(Uuid::new_v4().to_string()),
            iat,
            exp: iat + CREDENTIAL_TTL_DAYS * 24 * 60 * 60,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify a credential's signature and window.
    ///
    /// An elapsed window is reported distinctly from a bad signature so
    /// clients can branch on the reason code.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthenticationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The window is exact: a credential is valid until its expiry
        // instant and never after.
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthenticationError::CredentialExpired)
                }
                _ => Err(AuthenticationError::InvalidCredential),
            },
        }
    }
}

/// Read the expiry claim without verifying the signature.
///
/// Used only on the revocation teardown path, where the caller already
/// authenticated the session being torn down. Returns `None` for tokens
/// that do not even decode.
pub fn decode_expiry_unverified(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Hash a login password for storage and comparison (raw passwords are
/// never stored).
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
