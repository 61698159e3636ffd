//! Application state wiring and server startup.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api;
use crate::auth::{CredentialIssuer, PrincipalStore, RequestAuthenticator, RevocationStore};
use crate::config::ServerConfig;
use crate::db::{Db, create_connection, ensure_schema};
use crate::notify::{NotificationDispatcher, NotificationStore};
use crate::realtime::SessionRegistry;
use crate::tenant::{TenantResolver, TenantStore};

/// Shared state handed to every handler.
///
/// The session registry is owned here and passed by reference into the
/// dispatcher; it is request-handling state, not a global.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub issuer: Arc<CredentialIssuer>,
    pub authenticator: Arc<RequestAuthenticator>,
    pub resolver: Arc<TenantResolver>,
    pub revocations: Arc<RevocationStore>,
    pub principals: Arc<PrincipalStore>,
    pub tenants: Arc<TenantStore>,
    pub notifications: Arc<NotificationStore>,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(db: Db, jwt_secret: &str) -> Self {
        let issuer = Arc::new(CredentialIssuer::new(jwt_secret));
        let revocations = Arc::new(RevocationStore::new(db.clone()));
        let principals = Arc::new(PrincipalStore::new(db.clone()));
        let tenants = Arc::new(TenantStore::new(db.clone()));
        let notifications = Arc::new(NotificationStore::new(db.clone()));
        let registry = SessionRegistry::new();

        let authenticator = Arc::new(RequestAuthenticator::new(
            issuer.clone(),
            revocations.clone(),
            principals.clone(),
        ));
        let resolver = Arc::new(TenantResolver::new(tenants.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            registry.clone(),
        ));

        Self {
            db,
            issuer,
            authenticator,
            resolver,
            revocations,
            principals,
            tenants,
            notifications,
            registry,
            dispatcher,
        }
    }
}

/// Connect, apply schema, and serve the public and admin APIs until one of
/// them fails.
pub async fn run(config: ServerConfig) -> Result<()> {
    if config.is_dev_secret() {
        warn!("QUARRY_JWT_SECRET not set; using the development signing secret");
    }

    let db = create_connection(config.db.clone()).await?;
    ensure_schema(&db).await?;

    let state = AppState::new(db, &config.jwt_secret);

    let public_app = api::create_public_router(state.clone());
    let admin_app = api::create_admin_router(state);

    let public_listener = tokio::net::TcpListener::bind(&config.bind).await?;
    let admin_listener = tokio::net::TcpListener::bind(&config.admin_bind).await?;

    info!("public API listening on http://{}", config.bind);
    info!("admin API listening on http://{}", config.admin_bind);

    tokio::try_join!(
        axum::serve(public_listener, public_app),
        axum::serve(admin_listener, admin_app),
    )?;

    Ok(())
}
