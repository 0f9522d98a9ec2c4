use log::debug;
use shop_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderDetail},
    traits::ShopDatabaseError,
};

/// Inserts a new order row using the given connection. This is not atomic on its own. Embed this call inside the
/// order-creation transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    customer_id: i64,
    ship_address: &str,
    payment_method: &str,
    total_amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, ShopDatabaseError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                ship_address,
                payment_method,
                total_amount
            ) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(ship_address)
    .bind(payment_method)
    .bind(total_amount)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_order_detail(
    order_id: i64,
    product_id: i64,
    product_name: &str,
    quantity: i64,
    unit_price: Money,
    conn: &mut SqliteConnection,
) -> Result<OrderDetail, ShopDatabaseError> {
    let detail = sqlx::query_as(
        r#"
            INSERT INTO order_details (
                order_id,
                product_id,
                product_name,
                quantity,
                unit_price,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(quantity)
    .bind(unit_price)
    .bind(unit_price * quantity)
    .fetch_one(conn)
    .await?;
    Ok(detail)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_details(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderDetail>, sqlx::Error> {
    let details = sqlx::query_as("SELECT * FROM order_details WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(details)
}

/// Drives the order to `Completed` and stamps `completed_at`. Only payment reconciliation calls this.
pub async fn mark_order_completed(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, ShopDatabaseError> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'Completed', completed_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    let order = order.ok_or(ShopDatabaseError::OrderNotFound(order_id))?;
    debug!("📦️ Order {order_id} marked as Completed");
    Ok(order)
}

/// Drives the order to `Cancelled` and records the reason. Only payment reconciliation calls this.
pub async fn mark_order_cancelled(
    order_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, ShopDatabaseError> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'Cancelled', cancellation_reason = $1, updated_at = CURRENT_TIMESTAMP WHERE id = \
         $2 RETURNING *",
    )
    .bind(reason)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    let order = order.ok_or(ShopDatabaseError::OrderNotFound(order_id))?;
    debug!("📦️ Order {order_id} marked as Cancelled ({reason})");
    Ok(order)
}
