//! Customer domain types.

use widget_store_core::Email;

/// Parameters for inserting a customer. Customers are not deduplicated:
/// every checkout creates a new row.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}
