//! Notification storage.

use anyhow::{Result, anyhow};
use surrealdb::RecordId;

use crate::db::Db;
use crate::db::schema::{NotificationCreate, NotificationRecord};

/// Notification store for database operations.
///
/// Notifications are append-only; the only mutation is the one-way
/// unread -> read flip, always scoped to the owning principal.
pub struct NotificationStore {
    db: Db,
}

impl NotificationStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Durably insert a new, unread notification.
    pub async fn insert(&self, create: &NotificationCreate) -> Result<NotificationRecord> {
        let mut res = self
            .db
            .query(
                r#"
                CREATE notification CONTENT {
                    principal_id: $principal_id,
                    tenant_id: $tenant_id,
                    actor_id: $actor_id,
                    kind: $kind,
                    message: $message,
                    link: $link,
                    is_read: false,
                    created_at: time::now()
                }
                "#,
            )
            .bind(("principal_id", create.principal_id.clone()))
            .bind(("tenant_id", create.tenant_id.clone()))
            .bind(("actor_id", create.actor_id.clone()))
            .bind(("kind", create.kind))
            .bind(("message", create.message.clone()))
            .bind(("link", create.link.clone()))
            .await?;

        let created: Vec<NotificationRecord> = res.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("failed to create notification"))
    }

    /// Get a notification by database ID.
    pub async fn get(&self, id: &RecordId) -> Result<Option<NotificationRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM notification WHERE id = $id LIMIT 1")
            .bind(("id", id.clone()))
            .await?;

        let notifications: Vec<NotificationRecord> = res.take(0)?;
        Ok(notifications.into_iter().next())
    }

    /// All unread notifications for a principal, newest first.
    pub async fn find_unread(&self, principal_id: &RecordId) -> Result<Vec<NotificationRecord>> {
        let mut res = self
            .db
            .query(
                r#"
                SELECT * FROM notification
                WHERE principal_id = $principal_id AND is_read = false
                ORDER BY created_at DESC
                "#,
            )
            .bind(("principal_id", principal_id.clone()))
            .await?;

        let notifications: Vec<NotificationRecord> = res.take(0)?;
        Ok(notifications)
    }

    /// Mark one notification read. Scoped to the owning principal; returns
    /// whether a row actually flipped.
    pub async fn mark_read(&self, id: &RecordId, principal_id: &RecordId) -> Result<bool> {
        let mut res = self
            .db
            .query(
                r#"
                UPDATE notification SET is_read = true
                WHERE id = $id
                  AND principal_id = $principal_id
                  AND is_read = false
                "#,
            )
            .bind(("id", id.clone()))
            .bind(("principal_id", principal_id.clone()))
            .await?;

        let updated: Vec<NotificationRecord> = res.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Mark every unread notification of one principal read. Strictly
    /// scoped to that principal's own unread set; returns the count flipped.
    pub async fn mark_all_read(&self, principal_id: &RecordId) -> Result<usize> {
        let mut res = self
            .db
            .query(
                r#"
                UPDATE notification SET is_read = true
                WHERE principal_id = $principal_id AND is_read = false
                "#,
            )
            .bind(("principal_id", principal_id.clone()))
            .await?;

        let updated: Vec<NotificationRecord> = res.take(0)?;
        Ok(updated.len())
    }
}
