//! Order domain types.
//!
//! An [`Order`] is returned together with summaries of the widget,
//! transaction and customer it references, which is what the back office
//! lists and detail views display.

use chrono::{DateTime, Utc};
use serde::Serialize;

use widget_store_core::{
    Amount, CustomerId, Email, OrderId, StatusId, TransactionId, WidgetId,
};

/// A purchase of a widget. Subscriptions are orders whose widget is
/// recurring.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub widget_id: WidgetId,
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub status_id: StatusId,
    pub quantity: i32,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub widget: OrderWidget,
    pub transaction: OrderTransaction,
    pub customer: OrderCustomer,
}

/// Widget fields joined into an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWidget {
    pub id: WidgetId,
    pub name: String,
}

/// Transaction fields joined into an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTransaction {
    pub id: TransactionId,
    pub amount: Amount,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub payment_intent: String,
    pub bank_return_code: String,
}

/// Customer fields joined into an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// Parameters for recording an order once its transaction and customer
/// exist.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub widget_id: WidgetId,
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub status_id: StatusId,
    pub quantity: i32,
    pub amount: Amount,
}
