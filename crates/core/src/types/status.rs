//! Status enums for orders and transactions.
//!
//! Status rows live in lookup tables (`statuses`, `transaction_statuses`) and
//! orders reference them by numeric id. These enums name the ids seeded by the
//! migrations. Storage code passes raw [`StatusId`]s through untouched, so an
//! unknown id in the database is not an error until a caller asks for the enum.

use serde::{Deserialize, Serialize};

use super::id::{StatusId, TransactionStatusId};

/// Error returned when a numeric id does not name a known status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown status id: {0}")]
pub struct UnknownStatus(pub i32);

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Cleared,
    Refunded,
    Cancelled,
}

impl OrderStatus {
    /// The lookup-table id for this status.
    #[must_use]
    pub const fn id(self) -> StatusId {
        match self {
            Self::Cleared => StatusId::new(1),
            Self::Refunded => StatusId::new(2),
            Self::Cancelled => StatusId::new(3),
        }
    }
}

impl TryFrom<StatusId> for OrderStatus {
    type Error = UnknownStatus;

    fn try_from(id: StatusId) -> Result<Self, Self::Error> {
        match id.as_i32() {
            1 => Ok(Self::Cleared),
            2 => Ok(Self::Refunded),
            3 => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cleared => write!(f, "cleared"),
            Self::Refunded => write!(f, "refunded"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment transaction status.
///
/// Transitions are driven by the payment gateway, never by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Cleared,
    Declined,
    Refunded,
    PartiallyRefunded,
}

impl TransactionStatus {
    /// The lookup-table id for this status.
    #[must_use]
    pub const fn id(self) -> TransactionStatusId {
        match self {
            Self::Pending => TransactionStatusId::new(1),
            Self::Cleared => TransactionStatusId::new(2),
            Self::Declined => TransactionStatusId::new(3),
            Self::Refunded => TransactionStatusId::new(4),
            Self::PartiallyRefunded => TransactionStatusId::new(5),
        }
    }
}

impl TryFrom<TransactionStatusId> for TransactionStatus {
    type Error = UnknownStatus;

    fn try_from(id: TransactionStatusId) -> Result<Self, Self::Error> {
        match id.as_i32() {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Cleared),
            3 => Ok(Self::Declined),
            4 => Ok(Self::Refunded),
            5 => Ok(Self::PartiallyRefunded),
            other => Err(UnknownStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_ids_round_trip() {
        for status in [
            OrderStatus::Cleared,
            OrderStatus::Refunded,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::try_from(status.id()), Ok(status));
        }
    }

    #[test]
    fn test_unknown_order_status() {
        assert_eq!(
            OrderStatus::try_from(StatusId::new(99)),
            Err(UnknownStatus(99))
        );
    }

    #[test]
    fn test_transaction_status_ids() {
        assert_eq!(TransactionStatus::Cleared.id().as_i32(), 2);
        assert_eq!(
            TransactionStatus::try_from(TransactionStatusId::new(5)),
            Ok(TransactionStatus::PartiallyRefunded)
        );
        assert!(TransactionStatus::try_from(TransactionStatusId::new(0)).is_err());
    }

    #[test]
    fn test_order_status_display() {
        assert_eq!(OrderStatus::Refunded.to_string(), "refunded");
    }
}
