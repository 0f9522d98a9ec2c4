use sqlx::SqliteConnection;

use crate::{db_types::Product, traits::ShopDatabaseError};

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Decrements the stock ledger for the product. The guard clause means the update silently matches zero rows if the
/// decrement would take the quantity negative; callers must treat that as insufficient stock. Embed this inside the
/// order-creation transaction so a later failure rolls the decrement back.
pub async fn decrement_stock(
    product_id: i64,
    amount: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, ShopDatabaseError> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND quantity >= \
         $1",
    )
    .bind(amount)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
