//! Widget (catalog) repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use widget_store_core::{Amount, WidgetId};

use super::{QUERY_TIMEOUT, RepositoryError, bounded};
use crate::models::Widget;

#[derive(Debug, sqlx::FromRow)]
struct WidgetRow {
    id: WidgetId,
    name: String,
    description: String,
    inventory_level: i32,
    price: Amount,
    image: String,
    is_recurring: bool,
    plan_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WidgetRow> for Widget {
    fn from(row: WidgetRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            inventory_level: row.inventory_level,
            price: row.price,
            image: row.image,
            is_recurring: row.is_recurring,
            plan_id: row.plan_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for catalog lookups.
pub struct WidgetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WidgetRepository<'a> {
    /// Create a new widget repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a widget by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no widget has this id.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(widget_id = %id))]
    pub async fn get_by_id(&self, id: WidgetId) -> Result<Widget, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let row = sqlx::query_as::<_, WidgetRow>(
                r"
                SELECT id, name, description, inventory_level, price, image,
                       is_recurring, plan_id, created_at, updated_at
                FROM widgets
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            Ok(row.into())
        })
        .await
    }
}
