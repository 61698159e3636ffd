//! Notification dispatch: durable write, then realtime fan-out.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde_json::Value;
use surrealdb::RecordId;
use tracing::debug;

use crate::db::schema::{NotificationCreate, NotificationRecord};
use crate::notify::store::NotificationStore;
use crate::realtime::{Room, ServerMessage, SessionRegistry};
use crate::types::IssueId;

/// Persists notifications and fans domain events out to rooms.
///
/// "Write then publish" is message-passing, not a transaction: the two
/// steps are deliberately explicit and sequential so the happens-before
/// guarantee is visible here rather than hidden in a store-level change
/// feed. Persistence failures abort the dispatch; publish is best-effort.
///
/// The dispatcher does not deduplicate repeated calls for the same logical
/// event — idempotence is the caller's contract.
pub struct NotificationDispatcher {
    store: Arc<NotificationStore>,
    registry: Arc<SessionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<NotificationStore>, registry: Arc<SessionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Dispatch a notification to a principal.
    ///
    /// Durably inserts the record, re-reads it so the live-pushed shape is
    /// guaranteed identical to what a later unread poll returns, then
    /// publishes to the target's personal room. A poll issued immediately
    /// after the live event always finds the record.
    pub async fn dispatch(&self, create: NotificationCreate) -> Result<NotificationRecord> {
        let inserted = self.store.insert(&create).await?;

        // Re-read the persisted row; the pushed payload must be exactly
        // what a subsequent fetch would return.
        let record = self
            .store
            .get(&inserted.id)
            .await?
            .ok_or_else(|| anyhow!("notification vanished between insert and read-back"))?;

        let delivered = self
            .registry
            .publish(
                &Room::personal(&record.principal_id),
                ServerMessage::NotificationCreated(record.clone()),
            )
            .await;
        debug!(
            "notification {} dispatched to {delivered} live connection(s)",
            record.id
        );

        Ok(record)
    }

    /// Fan a new comment out to its issue room. Best-effort; the comment
    /// itself was already persisted by the domain layer.
    pub async fn publish_comment_created(&self, issue_id: &IssueId, comment: Value) -> usize {
        self.registry
            .publish(
                &Room::issue(issue_id.as_str()),
                ServerMessage::CommentCreated(comment),
            )
            .await
    }

    /// Fan an issue change out to its issue room and, when a tenant is
    /// known, to that tenant's community room.
    pub async fn publish_issue_updated(
        &self,
        issue_id: &IssueId,
        tenant_id: Option<&RecordId>,
        issue: Value,
    ) -> usize {
        let message = ServerMessage::IssueUpdated(issue);

        let mut delivered = self
            .registry
            .publish(&Room::issue(issue_id.as_str()), message.clone())
            .await;

        if let Some(tenant_id) = tenant_id {
            delivered += self
                .registry
                .publish(&Room::community(tenant_id), message)
                .await;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::NotificationKind;
    use crate::db::{Db, DatabaseConfig, create_connection, ensure_schema};

    async fn setup_test_db() -> Db {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        db
    }

    struct Fixture {
        store: Arc<NotificationStore>,
        registry: Arc<SessionRegistry>,
        dispatcher: NotificationDispatcher,
    }

    async fn setup() -> Fixture {
        let store = Arc::new(NotificationStore::new(setup_test_db().await));
        let registry = SessionRegistry::new();
        Fixture {
            store: store.clone(),
            registry: registry.clone(),
            dispatcher: NotificationDispatcher::new(store, registry),
        }
    }

    fn target() -> RecordId {
        RecordId::from_table_key("principal", "p1")
    }

    fn sample_create() -> NotificationCreate {
        NotificationCreate {
            principal_id: target(),
            tenant_id: None,
            actor_id: None,
            kind: NotificationKind::IssueAssigned,
            message: "Issue assigned to you".to_string(),
            link: Some("/issues/7".to_string()),
        }
    }

    // A connection already in the personal room receives the dispatched
    // notification live; a connection arriving only afterwards still finds
    // it via an unread fetch.
    #[tokio::test]
    async fn test_live_push_and_later_poll_see_the_same_record() {
        let fixture = setup().await;

        let (conn, mut rx) = fixture.registry.register().await;
        fixture
            .registry
            .join(conn, Room::personal(&target()))
            .await;

        let dispatched = fixture.dispatcher.dispatch(sample_create()).await.unwrap();

        // Live connection got exactly the persisted record.
        match rx.try_recv().unwrap() {
            ServerMessage::NotificationCreated(pushed) => {
                assert_eq!(pushed.id, dispatched.id);
                assert_eq!(pushed.message, dispatched.message);
                assert_eq!(pushed.created_at, dispatched.created_at);
            }
            other => panic!("unexpected frame: {other:?}"),
        }

        // A later joiner polls and finds the same record.
        let unread = fixture.store.find_unread(&target()).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, dispatched.id);
    }

    #[tokio::test]
    async fn test_dispatch_persists_even_with_no_live_connections() {
        let fixture = setup().await;

        let dispatched = fixture.dispatcher.dispatch(sample_create()).await.unwrap();

        let stored = fixture.store.get(&dispatched.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_does_not_deduplicate() {
        let fixture = setup().await;

        fixture.dispatcher.dispatch(sample_create()).await.unwrap();
        fixture.dispatcher.dispatch(sample_create()).await.unwrap();

        assert_eq!(fixture.store.find_unread(&target()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_comment_fan_out_reaches_only_issue_room() {
        let fixture = setup().await;

        let (joined, mut rx_joined) = fixture.registry.register().await;
        let (_outsider, mut rx_outsider) = fixture.registry.register().await;
        fixture.registry.join(joined, Room::issue("issue:42")).await;

        let delivered = fixture
            .dispatcher
            .publish_comment_created(&IssueId::new("issue:42"), serde_json::json!({"body": "hello"}))
            .await;

        assert_eq!(delivered, 1);
        assert!(matches!(
            rx_joined.try_recv().unwrap(),
            ServerMessage::CommentCreated(_)
        ));
        assert!(rx_outsider.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_issue_update_reaches_issue_and_community_rooms() {
        let fixture = setup().await;
        let tenant = RecordId::from_table_key("tenant", "t1");

        let (viewer, mut rx_viewer) = fixture.registry.register().await;
        let (member, mut rx_member) = fixture.registry.register().await;
        fixture.registry.join(viewer, Room::issue("issue:42")).await;
        fixture.registry.join(member, Room::community(&tenant)).await;

        let delivered = fixture
            .dispatcher
            .publish_issue_updated(
                &IssueId::new("issue:42"),
                Some(&tenant),
                serde_json::json!({"status": "closed"}),
            )
            .await;

        assert_eq!(delivered, 2);
        assert!(matches!(
            rx_viewer.try_recv().unwrap(),
            ServerMessage::IssueUpdated(_)
        ));
        assert!(matches!(
            rx_member.try_recv().unwrap(),
            ServerMessage::IssueUpdated(_)
        ));
    }
}
