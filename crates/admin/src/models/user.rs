//! Staff user domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use widget_store_core::{Email, UserId};

/// A staff account.
///
/// The password hash never leaves the repository layer; see
/// [`crate::db::UserRepository::get_with_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Lowercase-normalized email.
    pub email: Email,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name stored alongside issued tokens.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(1),
            first_name: "Ada".to_owned(),
            last_name: String::new(),
            email: Email::parse("ada@example.com").unwrap(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.full_name(), "Ada");
    }
}
