//! Wire format of WebSocket messages.

use serde::{Deserialize, Serialize};

use widget_store_core::UserId;

/// Action sent by an admin client when a staff user has been deleted.
pub const ACTION_DELETE_USER: &str = "deleteUser";
/// Action a client sends to attach a display name to its connection.
pub const ACTION_IDENTIFY: &str = "identify";
/// Action telling clients the user they are signed in as must log out.
pub const ACTION_LOGOUT: &str = "logout";

const WELCOME_MESSAGE: &str = "Connected to server";
const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted";

/// A message sent by a client. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundEvent {
    pub action: String,
    pub message: String,
    pub username: String,
    pub message_type: String,
    pub user_id: UserId,
}

/// What the hub should do with an [`InboundEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    DeleteUser,
    Identify,
    Unknown(&'a str),
}

impl InboundEvent {
    /// Classify the event's action.
    #[must_use]
    pub fn action(&self) -> Action<'_> {
        match self.action.as_str() {
            ACTION_DELETE_USER => Action::DeleteUser,
            ACTION_IDENTIFY => Action::Identify,
            other => Action::Unknown(other),
        }
    }

    /// Event requesting that `user_id` be logged out everywhere.
    #[must_use]
    pub fn delete_user(user_id: UserId) -> Self {
        Self {
            action: ACTION_DELETE_USER.to_owned(),
            user_id,
            ..Self::default()
        }
    }
}

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub action: String,
    pub message: String,
    pub user_id: UserId,
}

impl OutboundEvent {
    /// Sent once, immediately after the upgrade.
    #[must_use]
    pub fn welcome() -> Self {
        Self {
            action: String::new(),
            message: WELCOME_MESSAGE.to_owned(),
            user_id: UserId::default(),
        }
    }

    /// Tells every client that `user_id` no longer exists.
    #[must_use]
    pub fn logout(user_id: UserId) -> Self {
        Self {
            action: ACTION_LOGOUT.to_owned(),
            message: ACCOUNT_DELETED_MESSAGE.to_owned(),
            user_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_wire_format() {
        let json = serde_json::to_value(OutboundEvent::welcome()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "", "message": "Connected to server", "user_id": 0})
        );
    }

    #[test]
    fn test_logout_wire_format() {
        let json = serde_json::to_value(OutboundEvent::logout(UserId::new(7))).unwrap();
        assert_eq!(json["action"], "logout");
        assert_eq!(json["message"], "Your account has been deleted");
        assert_eq!(json["user_id"], 7);
    }

    #[test]
    fn test_inbound_fields_default() {
        let event: InboundEvent = serde_json::from_str(r#"{"action":"deleteUser"}"#).unwrap();
        assert_eq!(event.action(), Action::DeleteUser);
        assert_eq!(event.user_id, UserId::default());
        assert!(event.username.is_empty());
    }

    #[test]
    fn test_inbound_full_payload() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"action":"identify","message":"hi","username":"ada","message_type":"info","user_id":4}"#,
        )
        .unwrap();
        assert_eq!(event.action(), Action::Identify);
        assert_eq!(event.username, "ada");
        assert_eq!(event.user_id, UserId::new(4));
    }

    #[test]
    fn test_unknown_action() {
        let event: InboundEvent = serde_json::from_str(r#"{"action":"dance"}"#).unwrap();
        assert_eq!(event.action(), Action::Unknown("dance"));
    }

    #[test]
    fn test_malformed_inbound_rejected() {
        assert!(serde_json::from_str::<InboundEvent>("not json").is_err());
        assert!(serde_json::from_str::<InboundEvent>(r#"{"user_id":"seven"}"#).is_err());
    }
}
