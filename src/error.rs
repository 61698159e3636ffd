//! Error taxonomy for the session, tenant, and authorization pipeline.
//!
//! Every rejection carries a stable, machine-checkable reason code distinct
//! from its human message, so clients can branch (expired vs. revoked vs.
//! deactivated) without string matching. The pipeline halts at the first
//! failing stage; later stages never execute and cannot mask an earlier
//! cause.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

use crate::db::schema::Role;

/// Rejections produced by the request authenticator and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No bearer credential was presented
    MissingCredential,
    /// The credential is malformed or its signature does not verify
    InvalidCredential,
    /// The credential's fixed window has elapsed
    CredentialExpired,
    /// The credential was explicitly revoked before its natural expiry
    CredentialRevoked,
    /// The credential verified but its subject no longer exists
    PrincipalNotFound,
    /// The subject exists but has been deactivated
    PrincipalDeactivated,
    /// Login with an unknown email or wrong password
    InvalidLogin,
}

impl AuthenticationError {
    /// Stable reason code for client-side branching.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::CredentialExpired => "credential_expired",
            Self::CredentialRevoked => "credential_revoked",
            Self::PrincipalNotFound => "principal_not_found",
            Self::PrincipalDeactivated => "principal_deactivated",
            Self::InvalidLogin => "invalid_login",
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "Authentication required"),
            Self::InvalidCredential => write!(f, "Credential is invalid"),
            Self::CredentialExpired => write!(f, "Credential has expired"),
            Self::CredentialRevoked => write!(f, "Credential has been revoked"),
            Self::PrincipalNotFound => write!(f, "Principal not found"),
            Self::PrincipalDeactivated => write!(f, "Principal account is deactivated"),
            Self::InvalidLogin => write!(f, "Invalid email or password"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Rejections produced by tenant resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    /// No signal resolved a tenant and the principal is not an operator
    TenantRequired,
    /// The signaled tenant does not exist or is inactive
    NotFound,
}

impl TenantError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TenantRequired => "tenant_required",
            Self::NotFound => "tenant_not_found",
        }
    }
}

impl fmt::Display for TenantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TenantRequired => write!(f, "A tenant is required for this request"),
            Self::NotFound => write!(f, "Tenant not found"),
        }
    }
}

impl std::error::Error for TenantError {}

/// Rejection produced by the authorization gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationError {
    /// The minimum role the gate requires
    pub required: Role,
}

impl AuthorizationError {
    pub fn code(&self) -> &'static str {
        "insufficient_role"
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Requires the {} role", self.required)
    }
}

impl std::error::Error for AuthorizationError {}

/// Top-level error surfaced by the HTTP layer.
///
/// Authentication maps to 401, tenant resolution to 400/404, authorization
/// to 403. `Internal` covers persistence-dependent lookups and writes,
/// which fail closed; only revocation reads fail open (handled inside the
/// revocation store, never surfaced here).
#[derive(Debug)]
pub enum ApiError {
    Authentication(AuthenticationError),
    Tenant(TenantError),
    Authorization(AuthorizationError),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(e) => e.code(),
            Self::Tenant(e) => e.code(),
            Self::Authorization(e) => e.code(),
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Tenant(TenantError::TenantRequired) => StatusCode::BAD_REQUEST,
            Self::Tenant(TenantError::NotFound) => StatusCode::NOT_FOUND,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap a persistence error, failing closed.
    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication(e) => write!(f, "{e}"),
            Self::Tenant(e) => write!(f, "{e}"),
            Self::Authorization(e) => write!(f, "{e}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthenticationError> for ApiError {
    fn from(e: AuthenticationError) -> Self {
        Self::Authentication(e)
    }
}

impl From<TenantError> for ApiError {
    fn from(e: TenantError) -> Self {
        Self::Tenant(e)
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(e: AuthorizationError) -> Self {
        Self::Authorization(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        (self.status(), body).into_response()
    }
}
