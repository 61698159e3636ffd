//! Per-request authentication pipeline.

use std::sync::Arc;

use http::HeaderMap;
use surrealdb::RecordId;
use tracing::debug;

use crate::auth::credentials::CredentialIssuer;
use crate::auth::principal_store::PrincipalStore;
use crate::auth::revocation::RevocationStore;
use crate::db::schema::PrincipalRecord;
use crate::error::{ApiError, AuthenticationError};

/// Extract the bearer token from request headers, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Authenticates one request at a time.
///
/// The pipeline is strictly sequential and short-circuits with a distinct
/// reason at each stage: missing credential, invalid signature, expired,
/// revoked, principal not found, principal deactivated. Later stages never
/// run after a failure, so an earlier cause is never masked.
pub struct RequestAuthenticator {
    issuer: Arc<CredentialIssuer>,
    revocations: Arc<RevocationStore>,
    principals: Arc<PrincipalStore>,
}

impl RequestAuthenticator {
    pub fn new(
        issuer: Arc<CredentialIssuer>,
        revocations: Arc<RevocationStore>,
        principals: Arc<PrincipalStore>,
    ) -> Self {
        Self {
            issuer,
            revocations,
            principals,
        }
    }

    /// Run the full pipeline for a bearer credential.
    ///
    /// On success returns the principal with its home-tenant reference
    /// intact. There is no token refresh side effect. The revocation check
    /// fails open (see [`RevocationStore::is_revoked`]); the principal load
    /// fails closed.
    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<PrincipalRecord, ApiError> {
        let token = bearer.ok_or(AuthenticationError::MissingCredential)?;

        let claims = self.issuer.verify(token)?;

        if self.revocations.is_revoked(token).await {
            return Err(AuthenticationError::CredentialRevoked.into());
        }

        let id = RecordId::from_table_key("principal", claims.sub.clone());
        let principal = self
            .principals
            .get_by_id(&id)
            .await
            .map_err(ApiError::internal)?
            .ok_or(AuthenticationError::PrincipalNotFound)?;

        if !principal.is_active {
            return Err(AuthenticationError::PrincipalDeactivated.into());
        }

        debug!("authenticated principal {}", principal.id);

        // Best-effort; an authenticated request should not fail on this.
        let _ = self.principals.touch_last_seen(&principal.id).await;

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::hash_password;
    use crate::db::schema::{PrincipalCreate, Role};
    use crate::db::{Db, DatabaseConfig, create_connection, ensure_schema};

    async fn setup_test_db() -> Db {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        db
    }

    struct Fixture {
        issuer: Arc<CredentialIssuer>,
        revocations: Arc<RevocationStore>,
        principals: Arc<PrincipalStore>,
        authenticator: RequestAuthenticator,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        let issuer = Arc::new(CredentialIssuer::new("test-secret"));
        let revocations = Arc::new(RevocationStore::new(db.clone()));
        let principals = Arc::new(PrincipalStore::new(db));
        let authenticator = RequestAuthenticator::new(
            issuer.clone(),
            revocations.clone(),
            principals.clone(),
        );
        Fixture {
            issuer,
            revocations,
            principals,
            authenticator,
        }
    }

    async fn create_principal(fixture: &Fixture) -> PrincipalRecord {
        fixture
            .principals
            .create(&PrincipalCreate {
                email: "user@example.com".to_string(),
                display_name: None,
                password_hash: hash_password("hunter2"),
                role: Role::Member,
                tenant_id: None,
            })
            .await
            .unwrap()
    }

    fn assert_auth_err(result: Result<PrincipalRecord, ApiError>, expected: AuthenticationError) {
        match result {
            Err(ApiError::Authentication(e)) => assert_eq!(e, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let fixture = setup().await;
        assert_auth_err(
            fixture.authenticator.authenticate(None).await,
            AuthenticationError::MissingCredential,
        );
    }

    #[tokio::test]
    async fn test_invalid_credential() {
        let fixture = setup().await;
        assert_auth_err(
            fixture.authenticator.authenticate(Some("garbage")).await,
            AuthenticationError::InvalidCredential,
        );
    }

    #[tokio::test]
    async fn test_successful_authentication() {
        let fixture = setup().await;
        let principal = create_principal(&fixture).await;
        let token = fixture.issuer.issue(&principal.id).unwrap();

        let authenticated = fixture
            .authenticator
            .authenticate(Some(&token))
            .await
            .unwrap();
        assert_eq!(authenticated.id, principal.id);
    }

    #[tokio::test]
    async fn test_unknown_principal() {
        let fixture = setup().await;
        let token = fixture
            .issuer
            .issue(&RecordId::from_table_key("principal", "ghost"))
            .unwrap();

        assert_auth_err(
            fixture.authenticator.authenticate(Some(&token)).await,
            AuthenticationError::PrincipalNotFound,
        );
    }

    #[tokio::test]
    async fn test_deactivated_principal() {
        let fixture = setup().await;
        let principal = create_principal(&fixture).await;
        let token = fixture.issuer.issue(&principal.id).unwrap();

        fixture.principals.deactivate(&principal.id).await.unwrap();

        assert_auth_err(
            fixture.authenticator.authenticate(Some(&token)).await,
            AuthenticationError::PrincipalDeactivated,
        );
    }

    // Login issues a credential, the credential authenticates, logout
    // revokes it, and the identical request then fails specifically as
    // revoked (not expired or invalid) before the natural expiry.
    #[tokio::test]
    async fn test_revoked_credential_fails_as_revoked() {
        let fixture = setup().await;
        let principal = create_principal(&fixture).await;
        let token = fixture.issuer.issue(&principal.id).unwrap();

        // Authenticates fine before revocation.
        fixture
            .authenticator
            .authenticate(Some(&token))
            .await
            .unwrap();

        // Logout.
        fixture.revocations.add(&token).await.unwrap();

        assert_auth_err(
            fixture.authenticator.authenticate(Some(&token)).await,
            AuthenticationError::CredentialRevoked,
        );
    }

    #[tokio::test]
    async fn test_revocation_of_one_token_leaves_others_valid() {
        let fixture = setup().await;
        let principal = create_principal(&fixture).await;
        let revoked = fixture.issuer.issue(&principal.id).unwrap();
        let kept = fixture.issuer.issue(&principal.id).unwrap();

        fixture.revocations.add(&revoked).await.unwrap();

        assert_auth_err(
            fixture.authenticator.authenticate(Some(&revoked)).await,
            AuthenticationError::CredentialRevoked,
        );
        fixture
            .authenticator
            .authenticate(Some(&kept))
            .await
            .unwrap();
    }
}
