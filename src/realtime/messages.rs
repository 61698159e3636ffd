//! Wire frames for the realtime channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::schema::NotificationRecord;
use crate::realtime::registry::Room;

/// Frames a client may send. Each one is an explicit room join; clients
/// join issue rooms on view-enter and rejoin everything after a reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinPersonal { principal_id: String },
    JoinCommunity { tenant_id: String },
    JoinIssue { issue_id: String },
}

impl ClientMessage {
    /// The room this frame asks to join.
    pub fn room(&self) -> Room {
        match self {
            Self::JoinPersonal { principal_id } => Room::Personal(principal_id.clone()),
            Self::JoinCommunity { tenant_id } => Room::Community(tenant_id.clone()),
            Self::JoinIssue { issue_id } => Room::Issue(issue_id.clone()),
        }
    }
}

/// Frames the server pushes to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A notification was persisted for the room's principal.
    NotificationCreated(NotificationRecord),
    /// A comment landed on the room's issue. Payload shape is owned by the
    /// domain layer.
    CommentCreated(Value),
    /// The room's issue changed. Payload shape is owned by the domain layer.
    IssueUpdated(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{"type":"join-issue","data":{"issueId":"issue:42"}}"#;
        let parsed: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            ClientMessage::JoinIssue {
                issue_id: "issue:42".to_string()
            }
        );
        assert_eq!(parsed.room(), Room::Issue("issue:42".to_string()));
    }

    #[test]
    fn test_join_personal_round_trip() {
        let msg = ClientMessage::JoinPersonal {
            principal_id: "principal:p1".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"join-personal\""));
        assert!(json.contains("\"principalId\""));

        let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_server_message_tags() {
        let msg = ServerMessage::CommentCreated(serde_json::json!({"body": "hi"}));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"comment-created\""));

        let msg = ServerMessage::IssueUpdated(serde_json::json!({"status": "closed"}));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"issue-updated\""));
    }

    #[test]
    fn test_unknown_frame_rejected() {
        let json = r#"{"type":"leave-issue","data":{"issueId":"issue:42"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }
}
