//! HTTP surface: public API, internal admin API, and the pipeline
//! middleware gluing the authenticator, tenant resolver, and authorization
//! gate together.

use axum::{
    Json, Router,
    extract::{Extension, Path, Request, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use surrealdb::RecordId;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{RequestIdentity, bearer_token, hash_password};
use crate::authz;
use crate::db::schema::{NotificationCreate, NotificationKind, PrincipalView, Role};
use crate::error::{ApiError, AuthenticationError};
use crate::realtime::handle_socket;
use crate::server::AppState;

/// Header carrying the explicit tenant signal (subdomain-style key).
pub const TENANT_HEADER: &str = "x-tenant";

/// Query parameter carrying the explicit tenant override (record key).
pub const TENANT_OVERRIDE_PARAM: &str = "tenant";

pub fn create_public_router(state: AppState) -> Router {
    // These routes require the full authenticate -> resolve-tenant pipeline.
    let protected = Router::new()
        .route("/auth/session", get(session))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_notification_read))
        .route("/notifications/read-all", post(mark_all_notifications_read))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/ws", get(ws_upgrade))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Internal admin surface. Served on a separate trusted bind, and every
/// route is additionally operator-gated: the revocation store may be shared
/// infrastructure, so size/clear must never be reachable by regular
/// tenants.
pub fn create_admin_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/revocations/size", get(revocation_size))
        .route("/revocations/clear", post(revocation_clear))
        .route("/notify", post(dispatch_notification))
        // Layer order: the identity middleware (added last, outermost) runs
        // first and inserts the identity the operator gate then checks.
        .route_layer(middleware::from_fn(require_operator))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(gated)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Authenticate the request and resolve its tenant, then attach the
/// resulting [`RequestIdentity`] for handlers.
///
/// The stages run strictly in order and the first failure short-circuits:
/// an authentication rejection is never masked by a tenant problem, and a
/// tenant rejection is never masked by an authorization one.
async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state
        .authenticator
        .authenticate(bearer_token(req.headers()))
        .await?;

    let tenant_header = header_value(req.headers(), TENANT_HEADER);
    let tenant_override = query_param(req.uri(), TENANT_OVERRIDE_PARAM);

    let selection = state
        .resolver
        .resolve(
            tenant_header.as_deref(),
            tenant_override.as_deref(),
            &principal,
        )
        .await?;

    req.extensions_mut()
        .insert(RequestIdentity::new(principal, selection.into_option()));

    Ok(next.run(req).await)
}

/// Gate for the admin surface: platform operators only.
async fn require_operator(req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<RequestIdentity>()
        .cloned()
        .ok_or_else(|| ApiError::internal("request identity missing"))?;

    authz::require(&identity.principal, Role::Operator)?;
    Ok(next.run(req).await)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn query_param(uri: &Uri, name: &str) -> Option<String> {
    uri.query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Issue a credential for a principal.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let principal = state
        .principals
        .get_by_email(&req.email)
        .await
        .map_err(ApiError::internal)?
        .ok_or(AuthenticationError::InvalidLogin)?;

    if principal.password_hash != hash_password(&req.password) {
        return Err(AuthenticationError::InvalidLogin.into());
    }
    if !principal.is_active {
        return Err(AuthenticationError::PrincipalDeactivated.into());
    }

    let token = state.issuer.issue(&principal.id).map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({
        "token": token,
        "principal": PrincipalView::from(&principal),
    })))
}

/// Invalidate the presented credential.
///
/// Revocation is always attempted; a credential that is already expired
/// (or does not decode) is already dead, so the call still succeeds.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(AuthenticationError::MissingCredential)?;

    state
        .revocations
        .add(token)
        .await
        .map_err(ApiError::internal)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Who am I, and which tenant governs this request.
async fn session(Extension(identity): Extension<RequestIdentity>) -> Json<Value> {
    Json(serde_json::json!({
        "principal": PrincipalView::from(&identity.principal),
        "tenant": identity.tenant,
    }))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<Value>, ApiError> {
    let notifications = state
        .notifications
        .find_unread(&identity.principal.id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({
        "count": notifications.len(),
        "notifications": notifications,
    })))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = RecordId::from_table_key("notification", id);
    let updated = state
        .notifications
        .mark_read(&id, &identity.principal.id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .notifications
        .mark_all_read(&identity.principal.id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// Upgrade to the realtime channel. The connection starts anonymous and in
/// no rooms; membership comes only from explicit join frames.
async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
        .into_response()
}

async fn revocation_size(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let size = state
        .revocations
        .len()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(serde_json::json!({ "size": size })))
}

async fn revocation_clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .revocations
        .clear()
        .await
        .map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct NotifyRequest {
    /// Target principal record key
    principal_id: String,
    /// Tenant record key, if scoped
    tenant_id: Option<String>,
    /// Acting principal record key, if any
    actor_id: Option<String>,
    kind: NotificationKind,
    message: String,
    link: Option<String>,
}

/// Operational dispatch endpoint: persist and fan out a notification.
async fn dispatch_notification(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let create = NotificationCreate {
        principal_id: RecordId::from_table_key("principal", req.principal_id),
        tenant_id: req
            .tenant_id
            .map(|key| RecordId::from_table_key("tenant", key)),
        actor_id: req
            .actor_id
            .map(|key| RecordId::from_table_key("principal", key)),
        kind: req.kind,
        message: req.message,
        link: req.link,
    };

    let record = state
        .dispatcher
        .dispatch(create)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({ "notification": record })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_extraction() {
        let uri: Uri = "/auth/session?tenant=t1&x=2".parse().unwrap();
        assert_eq!(query_param(&uri, "tenant"), Some("t1".to_string()));
        assert_eq!(query_param(&uri, "x"), Some("2".to_string()));
        assert_eq!(query_param(&uri, "missing"), None);

        let bare: Uri = "/auth/session".parse().unwrap();
        assert_eq!(query_param(&bare, "tenant"), None);
    }
}
