//! Request-scoped identity attached after the pipeline succeeds.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::db::schema::{PrincipalRecord, Role, TenantRecord};

/// Identity of an authenticated request: the principal plus the single
/// tenant (or explicit no-tenant) resolution produced for it.
///
/// Immutable once created; handlers read it out of request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub principal: PrincipalRecord,
    /// `None` only for platform operators acting tenant-lessly.
    pub tenant: Option<TenantRecord>,
}

impl RequestIdentity {
    pub fn new(principal: PrincipalRecord, tenant: Option<TenantRecord>) -> Self {
        Self { principal, tenant }
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    /// The governing tenant's record id, if a tenant resolved.
    pub fn tenant_id(&self) -> Option<&RecordId> {
        self.tenant.as_ref().map(|t| &t.id)
    }
}
