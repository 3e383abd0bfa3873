//! Widget (catalog item) domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use widget_store_core::{Amount, WidgetId};

/// A catalog item.
///
/// `is_recurring` is what separates subscriptions from one-off orders; there
/// is no separate subscription entity.
#[derive(Debug, Clone, Serialize)]
pub struct Widget {
    pub id: WidgetId,
    pub name: String,
    pub description: String,
    pub inventory_level: i32,
    pub price: Amount,
    pub image: String,
    pub is_recurring: bool,
    /// Payment gateway plan identifier for recurring widgets.
    pub plan_id: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}
