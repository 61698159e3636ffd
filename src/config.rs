use serde::{Deserialize, Serialize};
use std::env;

use crate::db::DatabaseConfig;

/// Placeholder secret for local development. `serve` warns loudly when it
/// is still in effect.
pub const DEV_JWT_SECRET: &str = "quarry-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Public API bind address
    pub bind: String,
    /// Admin API bind address (internal / trusted only)
    pub admin_bind: String,
    /// Shared secret for credential signing and verification
    pub jwt_secret: String,
    pub db: DatabaseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: env::var("QUARRY_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            admin_bind: env::var("QUARRY_ADMIN_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8081".to_string()),
            jwt_secret: env::var("QUARRY_JWT_SECRET")
                .unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            db: DatabaseConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn is_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
