// Core modules
pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod realtime;
pub mod server;
pub mod tenant;
pub mod types;

// Re-export key types and functions
pub use auth::{
    CREDENTIAL_TTL_DAYS, CredentialIssuer, PrincipalStore, RequestAuthenticator, RequestIdentity,
    RevocationStore, hash_password,
};
pub use config::ServerConfig;
pub use db::{DatabaseConfig, create_connection, ensure_schema};
pub use error::{ApiError, AuthenticationError, AuthorizationError, TenantError};
pub use notify::{NotificationDispatcher, NotificationStore};
pub use realtime::{Room, SessionRegistry};
pub use server::AppState;
pub use tenant::{TenantResolver, TenantSelection, TenantStore};
