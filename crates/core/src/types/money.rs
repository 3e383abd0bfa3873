//! Monetary amounts.
//!
//! Amounts are stored and transmitted as integer minor units (cents), the
//! same representation the payment gateway uses. [`Amount::to_decimal`] gives
//! the major-unit value for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in minor currency units (e.g. cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i32);

impl Amount {
    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_cents(cents: i32) -> Self {
        Self(cents)
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn as_cents(&self) -> i32 {
        self.0
    }

    /// The amount in major units with two decimal places (e.g. `1999` -> `19.99`).
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl From<i32> for Amount {
    fn from(cents: i32) -> Self {
        Self(cents)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let cents = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(cents))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// ISO 4217 currency codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
}

impl CurrencyCode {
    /// The lowercase code as stored in the `transactions.currency` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Gbp => "gbp",
            Self::Cad => "cad",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_decimal() {
        assert_eq!(Amount::from_cents(1999).to_decimal(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_cents(1000).to_string(), "10.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Amount::from_cents(250)).ok();
        assert_eq!(json.as_deref(), Some("250"));
    }

    #[test]
    fn test_currency_code_str() {
        assert_eq!(CurrencyCode::Usd.as_str(), "usd");
        assert_eq!(CurrencyCode::default(), CurrencyCode::Usd);
    }
}
