//! Tenant storage.

use anyhow::{Result, anyhow};
use surrealdb::RecordId;

use crate::db::Db;
use crate::db::schema::{TenantCreate, TenantRecord};
use crate::types::TenantKey;

/// Tenant store for database operations.
pub struct TenantStore {
    db: Db,
}

impl TenantStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a new tenant. The key is normalized to lowercase and unique;
    /// a duplicate insert surfaces the index violation as an error.
    pub async fn create(&self, create: &TenantCreate) -> Result<TenantRecord> {
        let key = TenantKey::normalized(&create.key);
        let mut res = self
            .db
            .query(
                r#"
                CREATE tenant CONTENT {
                    key: $key,
                    display_name: $display_name,
                    is_active: true,
                    created_at: time::now(),
                    updated_at: time::now()
                }
                "#,
            )
            .bind(("key", key.into_inner()))
            .bind(("display_name", create.display_name.clone()))
            .await?;

        let created: Vec<TenantRecord> = res.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("failed to create tenant"))
    }

    /// Get a tenant by database ID, regardless of active flag.
    pub async fn get_by_id(&self, id: &RecordId) -> Result<Option<TenantRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM tenant WHERE id = $id LIMIT 1")
            .bind(("id", id.clone()))
            .await?;

        let tenants: Vec<TenantRecord> = res.take(0)?;
        Ok(tenants.into_iter().next())
    }

    /// Get an active tenant by its unique key.
    ///
    /// Inactive tenants are invisible here, not read-only: to a key lookup
    /// they simply do not exist.
    pub async fn get_by_key(&self, key: &TenantKey) -> Result<Option<TenantRecord>> {
        let mut res = self
            .db
            .query(
                r#"
                SELECT * FROM tenant
                WHERE key = $key AND is_active = true
                LIMIT 1
                "#,
            )
            .bind(("key", key.as_str().to_string()))
            .await?;

        let tenants: Vec<TenantRecord> = res.take(0)?;
        Ok(tenants.into_iter().next())
    }

    /// Deactivate a tenant, removing it from resolution.
    pub async fn deactivate(&self, id: &RecordId) -> Result<()> {
        self.db
            .query(
                r#"
                UPDATE tenant SET
                    is_active = false,
                    updated_at = time::now()
                WHERE id = $id
                "#,
            )
            .bind(("id", id.clone()))
            .await?;

        Ok(())
    }
}
