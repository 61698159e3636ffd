use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use surrealdb::{RecordId, sql::Datetime};

/// The bare key part of a record id (`"principal:abc"` -> `"abc"`).
pub fn record_key(id: &RecordId) -> String {
    let raw = id.to_string();
    match raw.split_once(':') {
        Some((_, key)) => key.to_string(),
        None => raw,
    }
}

/// Role of a principal, ordered from least to most privileged.
///
/// The derived `Ord` gives the strict total order the authorization gate
/// relies on: `Operator > Admin > Member`. A higher role always satisfies
/// a gate for a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member of a tenant.
    Member,
    /// Administrator of a tenant.
    Admin,
    /// Platform operator; may act without any tenant.
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Persisted principal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Database identifier
    pub id: RecordId,
    /// Unique login email
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// SHA-256 digest of the login password (raw passwords are never stored)
    pub password_hash: String,
    /// Role in the platform's strict hierarchy
    pub role: Role,
    /// Optional home tenant reference
    pub tenant_id: Option<RecordId>,
    /// Whether the principal may authenticate
    pub is_active: bool,
    /// When the principal was created
    pub created_at: Option<Datetime>,
    /// Last update time
    pub updated_at: Option<Datetime>,
    /// Last successful authentication time
    pub last_seen_at: Option<Datetime>,
}

/// Payload for creating a new principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalCreate {
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<RecordId>,
}

/// Client-facing projection of a principal. Never includes the password
/// digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalView {
    pub id: RecordId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub tenant_id: Option<RecordId>,
    pub is_active: bool,
}

impl From<&PrincipalRecord> for PrincipalView {
    fn from(record: &PrincipalRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            role: record.role,
            tenant_id: record.tenant_id.clone(),
            is_active: record.is_active,
        }
    }
}

/// Persisted tenant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Database identifier
    pub id: RecordId,
    /// Globally unique, lowercase subdomain key
    pub key: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Inactive tenants are invisible to resolution, not read-only
    pub is_active: bool,
    /// When the tenant was created
    pub created_at: Option<Datetime>,
    /// Last update time
    pub updated_at: Option<Datetime>,
}

/// Payload for creating a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCreate {
    pub key: String,
    pub display_name: Option<String>,
}

/// Kinds of notifications the platform emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An issue was assigned to the target principal
    IssueAssigned,
    /// Someone commented on an issue the target follows
    CommentAdded,
    /// An issue the target follows changed status
    StatusChanged,
    /// The target was mentioned in a comment
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::IssueAssigned => "issue_assigned",
            Self::CommentAdded => "comment_added",
            Self::StatusChanged => "status_changed",
            Self::Mention => "mention",
        }
    }
}

/// Persisted notification record. Append-only; only `is_read` mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Database identifier
    pub id: RecordId,
    /// The principal this notification targets
    pub principal_id: RecordId,
    /// Tenant scope, if any
    pub tenant_id: Option<RecordId>,
    /// The principal whose action triggered the notification, if any
    pub actor_id: Option<RecordId>,
    /// What happened
    pub kind: NotificationKind,
    /// Human-readable message
    pub message: String,
    /// Optional in-app link target
    pub link: Option<String>,
    /// Read flag, one-way unread -> read
    pub is_read: bool,
    /// When the notification was created
    pub created_at: Option<Datetime>,
}

/// Payload for creating a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreate {
    pub principal_id: RecordId,
    pub tenant_id: Option<RecordId>,
    pub actor_id: Option<RecordId>,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
}

/// Persisted revocation entry, keyed by the SHA-256 hash of the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationRecord {
    /// Database identifier
    pub id: RecordId,
    /// SHA-256 hash of the revoked credential string
    pub token_hash: String,
    /// Instant past which the entry is dead weight and ignored
    pub expires_at: Datetime,
    /// When the credential was revoked
    pub created_at: Option<Datetime>,
}
