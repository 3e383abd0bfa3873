//! Order and subscription repository.
//!
//! Orders and subscriptions share one table; the `is_recurring` flag on the
//! ordered widget decides which partition a row belongs to. Every read goes
//! through [`OrderQuery`], which produces both the statement text and the
//! parameters to bind, so the three retrieval modes never drift apart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use tracing::instrument;

use widget_store_core::{
    Amount, CustomerId, Email, OrderId, StatusId, TransactionId, WidgetId,
};

use super::{QUERY_TIMEOUT, RepositoryError, bounded};
use crate::models::{NewOrder, Order, OrderCustomer, OrderTransaction, OrderWidget};

const ORDER_COLUMNS: &str = r"
    SELECT
        o.id, o.widget_id, o.transaction_id, o.customer_id,
        o.status_id, o.quantity, o.amount, o.created_at, o.updated_at,
        w.name AS widget_name,
        t.amount AS transaction_amount, t.currency, t.last_four,
        t.expiry_month, t.expiry_year, t.payment_intent, t.bank_return_code,
        c.first_name, c.last_name, c.email
    FROM orders o
    JOIN widgets w ON o.widget_id = w.id
    JOIN transactions t ON o.transaction_id = t.id
    JOIN customers c ON o.customer_id = c.id";

const COUNT_PARTITION: &str = r"
    SELECT COUNT(o.id)
    FROM orders o
    JOIN widgets w ON o.widget_id = w.id
    WHERE w.is_recurring = $1";

// =============================================================================
// Query Builder
// =============================================================================

/// The three ways orders are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderQuery {
    /// A single order of either kind.
    ById(OrderId),
    /// A page of one-off orders, newest first.
    PagedOrders { limit: i64, offset: i64 },
    /// A page of subscriptions, newest first.
    PagedSubscriptions { limit: i64, offset: i64 },
}

/// A value bound to an [`OrderQuery`] placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParam {
    OrderId(OrderId),
    Recurring(bool),
    Limit(i64),
    Offset(i64),
}

impl OrderQuery {
    /// Build a paged query for the given partition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if `page_size` or `page` is
    /// below 1, or if the resulting offset does not fit in an `i64`.
    pub fn paged(page_size: i64, page: i64, recurring: bool) -> Result<Self, RepositoryError> {
        if page_size < 1 {
            return Err(RepositoryError::InvalidArgument(format!(
                "page_size must be at least 1, got {page_size}"
            )));
        }
        if page < 1 {
            return Err(RepositoryError::InvalidArgument(format!(
                "page must be at least 1, got {page}"
            )));
        }
        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            RepositoryError::InvalidArgument(format!("page {page} is out of range"))
        })?;

        Ok(if recurring {
            Self::PagedSubscriptions {
                limit: page_size,
                offset,
            }
        } else {
            Self::PagedOrders {
                limit: page_size,
                offset,
            }
        })
    }

    /// The recurring partition this query reads, or `None` for a lookup by id.
    #[must_use]
    pub const fn recurring(&self) -> Option<bool> {
        match self {
            Self::ById(_) => None,
            Self::PagedOrders { .. } => Some(false),
            Self::PagedSubscriptions { .. } => Some(true),
        }
    }

    /// The SQL statement for this query.
    #[must_use]
    pub fn sql(&self) -> String {
        match self {
            Self::ById(_) => format!("{ORDER_COLUMNS}\n    WHERE o.id = $1"),
            Self::PagedOrders { .. } | Self::PagedSubscriptions { .. } => format!(
                "{ORDER_COLUMNS}\n    WHERE w.is_recurring = $1\n    \
                 ORDER BY o.created_at DESC\n    LIMIT $2 OFFSET $3"
            ),
        }
    }

    /// Parameters in placeholder order.
    #[must_use]
    pub fn params(&self) -> Vec<QueryParam> {
        match *self {
            Self::ById(id) => vec![QueryParam::OrderId(id)],
            Self::PagedOrders { limit, offset } => vec![
                QueryParam::Recurring(false),
                QueryParam::Limit(limit),
                QueryParam::Offset(offset),
            ],
            Self::PagedSubscriptions { limit, offset } => vec![
                QueryParam::Recurring(true),
                QueryParam::Limit(limit),
                QueryParam::Offset(offset),
            ],
        }
    }

    fn bind<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for param in self.params() {
            query = match param {
                QueryParam::OrderId(id) => query.bind(id),
                QueryParam::Recurring(recurring) => query.bind(recurring),
                QueryParam::Limit(limit) => query.bind(limit),
                QueryParam::Offset(offset) => query.bind(offset),
            };
        }
        query
    }
}

/// One page of orders plus the figures needed to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub current_page: i64,
    pub page_size: i64,
    /// `total_records / page_size`, rounded down. A partial final page is not
    /// counted; callers check the remainder themselves.
    pub last_page: i64,
    pub total_records: i64,
    pub orders: Vec<Order>,
}

/// Floor division of the record count by the page size.
#[must_use]
pub const fn last_page(total_records: i64, page_size: i64) -> i64 {
    if page_size < 1 {
        return 0;
    }
    total_records / page_size
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    widget_id: WidgetId,
    transaction_id: TransactionId,
    customer_id: CustomerId,
    status_id: StatusId,
    quantity: i32,
    amount: Amount,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    widget_name: String,
    transaction_amount: Amount,
    currency: String,
    last_four: String,
    expiry_month: i32,
    expiry_year: i32,
    payment_intent: String,
    bank_return_code: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid customer email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            widget_id: row.widget_id,
            transaction_id: row.transaction_id,
            customer_id: row.customer_id,
            status_id: row.status_id,
            quantity: row.quantity,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            widget: OrderWidget {
                id: row.widget_id,
                name: row.widget_name,
            },
            transaction: OrderTransaction {
                id: row.transaction_id,
                amount: row.transaction_amount,
                currency: row.currency,
                last_four: row.last_four,
                expiry_month: row.expiry_month,
                expiry_year: row.expiry_year,
                payment_intent: row.payment_intent,
                bank_return_code: row.bank_return_code,
            },
            customer: OrderCustomer {
                id: row.customer_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email,
            },
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order and subscription operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order (or subscription) with its widget, transaction and
    /// customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let query = OrderQuery::ById(id);
            let sql = query.sql();
            let row = query
                .bind(sqlx::query_as::<_, OrderRow>(&sql))
                .fetch_optional(self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?;

            row.try_into()
        })
        .await
    }

    /// Get one page of orders (`recurring = false`) or subscriptions
    /// (`recurring = true`), newest first.
    ///
    /// The page and the total come from two separate statements, so an insert
    /// landing between them can make the total disagree with the page. Both
    /// statements share one timeout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if `page_size` or `page` is
    /// below 1.
    /// Returns `RepositoryError::Timeout` if the queries exceed [`QUERY_TIMEOUT`].
    #[instrument(skip(self))]
    pub async fn list_paged(
        &self,
        page_size: i64,
        page: i64,
        recurring: bool,
    ) -> Result<OrderPage, RepositoryError> {
        let query = OrderQuery::paged(page_size, page, recurring)?;

        bounded(QUERY_TIMEOUT, async {
            let sql = query.sql();
            let rows = query
                .bind(sqlx::query_as::<_, OrderRow>(&sql))
                .fetch_all(self.pool)
                .await?;
            let orders = rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<Vec<Order>, _>>()?;

            let total_records: i64 = sqlx::query_scalar(COUNT_PARTITION)
                .bind(recurring)
                .fetch_one(self.pool)
                .await?;

            Ok(OrderPage {
                current_page: page,
                page_size,
                last_page: last_page(total_records, page_size),
                total_records,
                orders,
            })
        })
        .await
    }

    /// Set the status of an order.
    ///
    /// The status id is not checked against the status table, and an unknown
    /// order id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    /// Returns `RepositoryError::Timeout` if the update exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(order_id = %id, status_id = %status_id))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status_id: StatusId,
    ) -> Result<(), RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            sqlx::query("UPDATE orders SET status_id = $1, updated_at = now() WHERE id = $2")
                .bind(status_id)
                .bind(id)
                .execute(self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    /// Record a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (for example a
    /// dangling transaction or customer id).
    /// Returns `RepositoryError::Timeout` if the insert exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, order), fields(widget_id = %order.widget_id))]
    pub async fn insert(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let id = sqlx::query_scalar::<_, OrderId>(
                r"
                INSERT INTO orders
                    (widget_id, transaction_id, customer_id, status_id, quantity, amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                ",
            )
            .bind(order.widget_id)
            .bind(order.transaction_id)
            .bind(order.customer_id)
            .bind(order.status_id)
            .bind(order.quantity)
            .bind(order.amount)
            .fetch_one(self.pool)
            .await?;
            Ok(id)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_by_id_query() {
        let query = OrderQuery::ById(OrderId::new(12));
        let sql = query.sql();

        assert!(sql.contains("WHERE o.id = $1"));
        assert!(!sql.contains("is_recurring = $1"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(query.params(), vec![QueryParam::OrderId(OrderId::new(12))]);
        assert_eq!(query.recurring(), None);
    }

    #[test]
    fn test_paged_orders_query() {
        let query = OrderQuery::paged(10, 3, false).unwrap();
        assert_eq!(
            query,
            OrderQuery::PagedOrders {
                limit: 10,
                offset: 20
            }
        );

        let sql = query.sql();
        assert!(sql.contains("WHERE w.is_recurring = $1"));
        assert!(sql.contains("ORDER BY o.created_at DESC"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
        assert_eq!(
            query.params(),
            vec![
                QueryParam::Recurring(false),
                QueryParam::Limit(10),
                QueryParam::Offset(20),
            ]
        );
    }

    #[test]
    fn test_paged_subscriptions_query() {
        let query = OrderQuery::paged(5, 1, true).unwrap();
        assert_eq!(
            query,
            OrderQuery::PagedSubscriptions {
                limit: 5,
                offset: 0
            }
        );
        assert_eq!(query.recurring(), Some(true));
        assert_eq!(query.params()[0], QueryParam::Recurring(true));
    }

    #[test]
    fn test_paged_rejects_bad_arguments() {
        assert!(matches!(
            OrderQuery::paged(0, 1, false),
            Err(RepositoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            OrderQuery::paged(10, 0, false),
            Err(RepositoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            OrderQuery::paged(i64::MAX, 3, false),
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_last_page_rounds_down() {
        assert_eq!(last_page(25, 10), 2);
        assert_eq!(last_page(30, 10), 3);
        assert_eq!(last_page(9, 10), 0);
        assert_eq!(last_page(0, 10), 0);
    }

    #[test]
    fn test_placeholders_match_params() {
        for query in [
            OrderQuery::ById(OrderId::new(1)),
            OrderQuery::paged(10, 2, false).unwrap(),
            OrderQuery::paged(10, 2, true).unwrap(),
        ] {
            let sql = query.sql();
            let params = query.params();
            for n in 1..=params.len() {
                assert!(sql.contains(&format!("${n}")), "missing ${n} in {sql}");
            }
            assert!(!sql.contains(&format!("${}", params.len() + 1)));
        }
    }
}
