//! Principal storage and management.

use anyhow::{Result, anyhow};
use surrealdb::RecordId;

use crate::db::Db;
use crate::db::schema::{PrincipalCreate, PrincipalRecord};

/// Principal store for database operations.
pub struct PrincipalStore {
    db: Db,
}

impl PrincipalStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a new principal. The email is unique; a duplicate insert
    /// surfaces the index violation as an error.
    pub async fn create(&self, create: &PrincipalCreate) -> Result<PrincipalRecord> {
        let mut res = self
            .db
            .query(
                r#"
                CREATE principal CONTENT {
                    email: $email,
                    display_name: $display_name,
                    password_hash: $password_hash,
                    role: $role,
                    tenant_id: $tenant_id,
                    is_active: true,
                    created_at: time::now(),
                    updated_at: time::now(),
                    last_seen_at: time::now()
                }
                "#,
            )
            .bind(("email", create.email.clone()))
            .bind(("display_name", create.display_name.clone()))
            .bind(("password_hash", create.password_hash.clone()))
            .bind(("role", create.role))
            .bind(("tenant_id", create.tenant_id.clone()))
            .await?;

        let created: Vec<PrincipalRecord> = res.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("failed to create principal"))
    }

    /// Get a principal by database ID.
    pub async fn get_by_id(&self, id: &RecordId) -> Result<Option<PrincipalRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM principal WHERE id = $id LIMIT 1")
            .bind(("id", id.clone()))
            .await?;

        let principals: Vec<PrincipalRecord> = res.take(0)?;
        Ok(principals.into_iter().next())
    }

    /// Get a principal by unique login email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>> {
        let email = email.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM principal WHERE email = $email LIMIT 1")
            .bind(("email", email))
            .await?;

        let principals: Vec<PrincipalRecord> = res.take(0)?;
        Ok(principals.into_iter().next())
    }

    /// Deactivate a principal. Existing credentials stop authenticating at
    /// the principal-loaded stage of the pipeline.
    pub async fn deactivate(&self, id: &RecordId) -> Result<()> {
        self.db
            .query(
                r#"
                UPDATE principal SET
                    is_active = false,
                    updated_at = time::now()
                WHERE id = $id
                "#,
            )
            .bind(("id", id.clone()))
            .await?;

        Ok(())
    }

    /// Update the principal's last_seen_at timestamp.
    pub async fn touch_last_seen(&self, id: &RecordId) -> Result<()> {
        self.db
            .query("UPDATE principal SET last_seen_at = time::now() WHERE id = $id")
            .bind(("id", id.clone()))
            .await?;

        Ok(())
    }
}
