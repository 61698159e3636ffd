use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("QUARRY_DB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("QUARRY_DB_NAMESPACE").unwrap_or_else(|_| "quarry".to_string()),
            database: env::var("QUARRY_DB_DATABASE").unwrap_or_else(|_| "core".to_string()),
            username: env::var("QUARRY_DB_USERNAME").ok(),
            password: env::var("QUARRY_DB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    // Use the specified namespace and database
    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    // Define schema for each table
    let schema_queries = vec![
        // Principals (users of the platform)
        "DEFINE TABLE principal SCHEMAFULL;
         DEFINE FIELD email ON TABLE principal TYPE string;
         DEFINE FIELD display_name ON TABLE principal TYPE option<string>;
         DEFINE FIELD password_hash ON TABLE principal TYPE string;
         DEFINE FIELD role ON TABLE principal TYPE string;
         DEFINE FIELD tenant_id ON TABLE principal TYPE option<record<tenant>>;
         DEFINE FIELD is_active ON TABLE principal TYPE bool DEFAULT true;
         DEFINE FIELD created_at ON TABLE principal TYPE option<datetime>;
         DEFINE FIELD updated_at ON TABLE principal TYPE option<datetime>;
         DEFINE FIELD last_seen_at ON TABLE principal TYPE option<datetime>;",
        // Tenants (isolated organizational scopes)
        "DEFINE TABLE tenant SCHEMAFULL;
         DEFINE FIELD key ON TABLE tenant TYPE string;
         DEFINE FIELD display_name ON TABLE tenant TYPE option<string>;
         DEFINE FIELD is_active ON TABLE tenant TYPE bool DEFAULT true;
         DEFINE FIELD created_at ON TABLE tenant TYPE option<datetime>;
         DEFINE FIELD updated_at ON TABLE tenant TYPE option<datetime>;",
        // Notifications (append-only; only is_read mutates)
        "DEFINE TABLE notification SCHEMAFULL;
         DEFINE FIELD principal_id ON TABLE notification TYPE record<principal>;
         DEFINE FIELD tenant_id ON TABLE notification TYPE option<record<tenant>>;
         DEFINE FIELD actor_id ON TABLE notification TYPE option<record<principal>>;
         DEFINE FIELD kind ON TABLE notification TYPE string;
         DEFINE FIELD message ON TABLE notification TYPE string;
         DEFINE FIELD link ON TABLE notification TYPE option<string>;
         DEFINE FIELD is_read ON TABLE notification TYPE bool DEFAULT false;
         DEFINE FIELD created_at ON TABLE notification TYPE option<datetime>;",
        // Revoked credentials, keyed by token hash, self-expiring
        "DEFINE TABLE revocation SCHEMAFULL;
         DEFINE FIELD token_hash ON TABLE revocation TYPE string;
         DEFINE FIELD expires_at ON TABLE revocation TYPE datetime;
         DEFINE FIELD created_at ON TABLE revocation TYPE option<datetime>;",
        // Indexes
        "DEFINE INDEX principal_email ON TABLE principal COLUMNS email UNIQUE;
         DEFINE INDEX tenant_key ON TABLE tenant COLUMNS key UNIQUE;
         DEFINE INDEX notification_principal ON TABLE notification COLUMNS principal_id;
         DEFINE INDEX revocation_token ON TABLE revocation COLUMNS token_hash;",
    ];

    for query in schema_queries {
        db.query(query).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_connection_memory() {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();

        db.query("SELECT * FROM principal").await.unwrap();
    }
}
