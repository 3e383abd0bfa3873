//! Payment transaction domain types.

use widget_store_core::{Amount, CurrencyCode, TransactionStatusId};

/// The outcome of a payment attempt as reported by the payment gateway.
///
/// Rows are written once; only the status changes afterwards, and only in
/// response to gateway events.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Amount,
    pub currency: CurrencyCode,
    /// Last four digits of the card.
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub payment_intent: String,
    pub payment_method: String,
    pub bank_return_code: String,
    pub transaction_status_id: TransactionStatusId,
}
