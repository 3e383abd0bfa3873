//! Token scopes.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown scope tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid token scope: {0}")]
pub struct ScopeError(pub String);

/// What a token may be used for.
///
/// Only authentication exists today; the tag is stored with every token so
/// that other scopes can be added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    #[default]
    Authentication,
}

impl TokenScope {
    /// The tag stored alongside the token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
        }
    }
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenScope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authentication" => Ok(Self::Authentication),
            _ => Err(ScopeError(s.to_owned())),
        }
    }
}
