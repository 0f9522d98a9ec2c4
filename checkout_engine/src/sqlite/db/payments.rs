use log::trace;
use shop_common::Money;
use sqlx::{error::ErrorKind, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Payment, PaymentProvider, PaymentStatus},
    traits::{PaymentQueryFilter, ShopDatabaseError},
};

/// Inserts a new `Pending` payment attempt. The partial unique index on `(order_id) WHERE status = 'Pending'`
/// closes the race between the pre-insert check and the insert itself; a violation surfaces as
/// [`ShopDatabaseError::DuplicatePendingPayment`].
pub async fn insert_pending_payment(
    order_id: i64,
    amount: Money,
    provider: PaymentProvider,
    conn: &mut SqliteConnection,
) -> Result<Payment, ShopDatabaseError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount, provider, status) VALUES ($1, $2, $3, 'Pending')
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(amount)
    .bind(provider.to_string())
    .fetch_one(conn)
    .await;
    match result {
        Ok(payment) => Ok(payment),
        Err(sqlx::Error::Database(e)) if e.kind() == ErrorKind::UniqueViolation => {
            Err(ShopDatabaseError::DuplicatePendingPayment(order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn attach_gateway_details(
    payment_id: i64,
    txid: &str,
    checkout_url: &str,
    raw_response: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, ShopDatabaseError> {
    let payment: Option<Payment> = sqlx::query_as(
        "UPDATE payments SET txid = $1, checkout_url = $2, gateway_response = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $4 RETURNING *",
    )
    .bind(txid)
    .bind(checkout_url)
    .bind(raw_response)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    payment.ok_or(ShopDatabaseError::PaymentNotFound(payment_id))
}

pub async fn fetch_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_txid(txid: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE txid = $1").bind(txid).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at DESC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Fetches payments according to criteria specified in the `PaymentQueryFilter`.
///
/// Resulting payments are ordered by `created_at` in descending order.
pub async fn search_payments(
    filter: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(since) = filter.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC");
    trace!("💳️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Payment>();
    let payments = query.fetch_all(conn).await?;
    Ok(payments)
}

pub async fn update_payment_status(
    payment_id: i64,
    status: PaymentStatus,
    raw_response: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, ShopDatabaseError> {
    let payment: Option<Payment> = sqlx::query_as(
        "UPDATE payments SET status = $1, gateway_response = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 \
         RETURNING *",
    )
    .bind(status.to_string())
    .bind(raw_response)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    payment.ok_or(ShopDatabaseError::PaymentNotFound(payment_id))
}
