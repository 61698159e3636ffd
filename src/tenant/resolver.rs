//! Tenant resolution for authenticated requests.

use std::sync::Arc;

use surrealdb::RecordId;
use tracing::debug;

use crate::db::schema::{PrincipalRecord, Role, TenantRecord};
use crate::error::{ApiError, TenantError};
use crate::tenant::store::TenantStore;
use crate::types::TenantKey;

/// Outcome of tenant resolution: exactly one tenant, or an explicit
/// no-tenant outcome reserved for platform operators. Never ambiguity,
/// never a merge across tenants.
#[derive(Debug, Clone)]
pub enum TenantSelection {
    Tenant(TenantRecord),
    None,
}

impl TenantSelection {
    pub fn into_option(self) -> Option<TenantRecord> {
        match self {
            Self::Tenant(t) => Some(t),
            Self::None => None,
        }
    }
}

/// Determines the single tenant governing a request from three signals.
///
/// Precedence, first match wins:
/// 1. the explicit tenant header naming a tenant by its unique key
///    (case-insensitive, normalized lowercase),
/// 2. the principal's own home tenant,
/// 3. an explicit tenant override parameter (elevated operations).
///
/// A present signal must resolve: naming an unknown or inactive tenant is
/// "not found", never a silent fall-through to a weaker signal — that
/// fall-through is how cross-tenant leaks start.
pub struct TenantResolver {
    tenants: Arc<TenantStore>,
}

impl TenantResolver {
    pub fn new(tenants: Arc<TenantStore>) -> Self {
        Self { tenants }
    }

    pub async fn resolve(
        &self,
        header_key: Option<&str>,
        override_id: Option<&str>,
        principal: &PrincipalRecord,
    ) -> Result<TenantSelection, ApiError> {
        // 1. Explicit tenant header.
        if let Some(raw) = header_key {
            let key = TenantKey::normalized(raw);
            let tenant = self
                .tenants
                .get_by_key(&key)
                .await
                .map_err(ApiError::internal)?
                .ok_or(TenantError::NotFound)?;
            debug!("tenant resolved from header: {}", tenant.key);
            return Ok(TenantSelection::Tenant(tenant));
        }

        // 2. The principal's home tenant.
        if let Some(home_id) = &principal.tenant_id {
            let tenant = self.load_active(home_id).await?;
            debug!("tenant resolved from principal home: {}", tenant.key);
            return Ok(TenantSelection::Tenant(tenant));
        }

        // 3. Explicit override parameter.
        if let Some(raw) = override_id {
            let id = RecordId::from_table_key("tenant", raw);
            let tenant = self.load_active(&id).await?;
            debug!("tenant resolved from override parameter: {}", tenant.key);
            return Ok(TenantSelection::Tenant(tenant));
        }

        // Nothing resolved: operators may act tenant-lessly.
        if principal.role == Role::Operator {
            debug!("operator request proceeding with no tenant");
            return Ok(TenantSelection::None);
        }

        Err(TenantError::TenantRequired.into())
    }

    async fn load_active(&self, id: &RecordId) -> Result<TenantRecord, ApiError> {
        let tenant = self
            .tenants
            .get_by_id(id)
            .await
            .map_err(ApiError::internal)?
            .ok_or(TenantError::NotFound)?;

        if !tenant.is_active {
            return Err(TenantError::NotFound.into());
        }
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::auth::PrincipalStore;
    use crate::db::schema::{PrincipalCreate, TenantCreate};
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
        tenants: Arc<TenantStore>,
        principals: PrincipalStore,
        resolver: TenantResolver,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        let tenants = Arc::new(TenantStore::new(db.clone()));
        Fixture {
            tenants: tenants.clone(),
            principals: PrincipalStore::new(db),
            resolver: TenantResolver::new(tenants),
        }
    }

    async fn create_tenant(fixture: &Fixture, key: &str) -> TenantRecord {
        fixture
            .tenants
            .create(&TenantCreate {
                key: key.to_string(),
                display_name: None,
            })
            .await
            .unwrap()
    }

    async fn create_principal(
        fixture: &Fixture,
        email: &str,
        role: Role,
        tenant_id: Option<RecordId>,
    ) -> PrincipalRecord {
        fixture
            .principals
            .create(&PrincipalCreate {
                email: email.to_string(),
                display_name: None,
                password_hash: hash_password("hunter2"),
                role,
                tenant_id,
            })
            .await
            .unwrap()
    }

    fn expect_tenant(selection: TenantSelection) -> TenantRecord {
        match selection {
            TenantSelection::Tenant(t) => t,
            TenantSelection::None => panic!("expected a tenant, got no-tenant"),
        }
    }

    fn expect_tenant_err(result: Result<TenantSelection, ApiError>, expected: TenantError) {
        match result {
            Err(ApiError::Tenant(e)) => assert_eq!(e, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }

    // An explicit header for tenant A wins over the principal's home
    // tenant B.
    #[tokio::test]
    async fn test_header_beats_home_tenant() {
        let fixture = setup().await;
        let tenant_a = create_tenant(&fixture, "alpha").await;
        let tenant_b = create_tenant(&fixture, "beta").await;
        let principal =
            create_principal(&fixture, "u@example.com", Role::Member, Some(tenant_b.id)).await;

        let resolved = fixture
            .resolver
            .resolve(Some("Alpha"), None, &principal)
            .await
            .unwrap();
        assert_eq!(expect_tenant(resolved).id, tenant_a.id);
    }

    #[tokio::test]
    async fn test_home_tenant_used_without_header() {
        let fixture = setup().await;
        let tenant = create_tenant(&fixture, "alpha").await;
        let principal = create_principal(
            &fixture,
            "u@example.com",
            Role::Member,
            Some(tenant.id.clone()),
        )
        .await;

        let resolved = fixture
            .resolver
            .resolve(None, None, &principal)
            .await
            .unwrap();
        assert_eq!(expect_tenant(resolved).id, tenant.id);
    }

    #[tokio::test]
    async fn test_override_parameter_lowest_precedence() {
        let fixture = setup().await;
        let tenant = create_tenant(&fixture, "alpha").await;
        let operator = create_principal(&fixture, "op@example.com", Role::Operator, None).await;

        let key = crate::db::schema::record_key(&tenant.id);
        let resolved = fixture
            .resolver
            .resolve(None, Some(&key), &operator)
            .await
            .unwrap();
        assert_eq!(expect_tenant(resolved).id, tenant.id);
    }

    #[tokio::test]
    async fn test_operator_with_no_signal_gets_no_tenant() {
        let fixture = setup().await;
        let operator = create_principal(&fixture, "op@example.com", Role::Operator, None).await;

        let resolved = fixture
            .resolver
            .resolve(None, None, &operator)
            .await
            .unwrap();
        assert!(matches!(resolved, TenantSelection::None));
    }

    #[tokio::test]
    async fn test_non_operator_with_no_signal_fails_tenant_required() {
        let fixture = setup().await;
        let member = create_principal(&fixture, "u@example.com", Role::Member, None).await;

        expect_tenant_err(
            fixture.resolver.resolve(None, None, &member).await,
            TenantError::TenantRequired,
        );
    }

    #[tokio::test]
    async fn test_unknown_header_key_is_not_found_not_fallthrough() {
        let fixture = setup().await;
        let home = create_tenant(&fixture, "beta").await;
        let principal =
            create_principal(&fixture, "u@example.com", Role::Member, Some(home.id)).await;

        // The home tenant exists, but the explicit signal must not fall
        // through to it.
        expect_tenant_err(
            fixture
                .resolver
                .resolve(Some("missing"), None, &principal)
                .await,
            TenantError::NotFound,
        );
    }

    #[tokio::test]
    async fn test_inactive_tenant_resolves_as_not_found() {
        let fixture = setup().await;
        let tenant = create_tenant(&fixture, "alpha").await;
        fixture.tenants.deactivate(&tenant.id).await.unwrap();

        let principal =
            create_principal(&fixture, "u@example.com", Role::Member, Some(tenant.id)).await;

        expect_tenant_err(
            fixture.resolver.resolve(None, None, &principal).await,
            TenantError::NotFound,
        );
    }
}
