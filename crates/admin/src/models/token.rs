//! Authentication token.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use widget_store_core::{TokenScope, UserId};

/// A freshly generated bearer token.
///
/// The plaintext exists only in memory and in the response that hands it to
/// the client; the database stores `hash`.
#[derive(Clone)]
pub struct Token {
    pub plain_text: String,
    pub user_id: UserId,
    /// SHA-256 of `plain_text`.
    pub hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("plain_text", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("hash", &hex::encode(&self.hash))
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Serializes as `{"token": ..., "expiry": ...}`, the shape returned by the
/// authenticate endpoint.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Token", 2)?;
        state.serialize_field("token", &self.plain_text)?;
        state.serialize_field("expiry", &self.expiry)?;
        state.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token {
            plain_text: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_owned(),
            user_id: UserId::new(3),
            hash: vec![0xde, 0xad],
            expiry: Utc::now(),
            scope: TokenScope::Authentication,
        }
    }

    #[test]
    fn test_debug_redacts_plain_text() {
        let debug = format!("{:?}", token());
        assert!(!debug.contains("ABCDEFGHIJ"));
        assert!(debug.contains("dead"));
    }

    #[test]
    fn test_serializes_token_and_expiry_only() {
        let value = serde_json::to_value(token()).unwrap();
        assert_eq!(value["token"], "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert!(value.get("expiry").is_some());
        assert!(value.get("hash").is_none());
    }
}
