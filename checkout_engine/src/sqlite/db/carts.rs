use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cart, CartItem},
    traits::ShopDatabaseError,
};

pub async fn fetch_cart_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Cart>, sqlx::Error> {
    let cart =
        sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1").bind(customer_id).fetch_optional(conn).await?;
    Ok(cart)
}

/// Fetches the customer's cart, creating it lazily if it does not exist yet. The unique index on `customer_id`
/// makes a concurrent double-create collapse onto the same row.
pub async fn fetch_or_create_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Cart, ShopDatabaseError> {
    if let Some(cart) = fetch_cart_for_customer(customer_id, &mut *conn).await? {
        return Ok(cart);
    }
    sqlx::query("INSERT INTO carts (customer_id) VALUES ($1) ON CONFLICT (customer_id) DO NOTHING")
        .bind(customer_id)
        .execute(&mut *conn)
        .await?;
    debug!("🛒️ Created cart for customer {customer_id}");
    fetch_cart_for_customer(customer_id, conn)
        .await?
        .ok_or_else(|| ShopDatabaseError::DatabaseError(format!("Cart for customer {customer_id} vanished after insert")))
}

pub async fn fetch_cart_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at ASC")
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_cart_item(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Adds a line to the cart, incrementing the quantity if the product is already present.
pub async fn upsert_cart_item(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, ShopDatabaseError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn set_quantity(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, ShopDatabaseError> {
    let item = sqlx::query_as(
        "UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP WHERE cart_id = $2 AND product_id = $3 \
         RETURNING *",
    )
    .bind(quantity)
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    item.ok_or(ShopDatabaseError::ItemNotInCart { product_id })
}

pub async fn delete_cart_item(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), ShopDatabaseError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ShopDatabaseError::ItemNotInCart { product_id });
    }
    Ok(())
}

pub async fn set_selected(
    cart_id: i64,
    product_id: i64,
    selected: bool,
    conn: &mut SqliteConnection,
) -> Result<CartItem, ShopDatabaseError> {
    let item = sqlx::query_as(
        "UPDATE cart_items SET selected = $1, updated_at = CURRENT_TIMESTAMP WHERE cart_id = $2 AND product_id = $3 \
         RETURNING *",
    )
    .bind(selected)
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    item.ok_or(ShopDatabaseError::ItemNotInCart { product_id })
}

pub async fn set_all_selected(
    cart_id: i64,
    selected: bool,
    conn: &mut SqliteConnection,
) -> Result<u64, ShopDatabaseError> {
    let result =
        sqlx::query("UPDATE cart_items SET selected = $1, updated_at = CURRENT_TIMESTAMP WHERE cart_id = $2")
            .bind(selected)
            .bind(cart_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub async fn clear_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<u64, ShopDatabaseError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(conn).await?;
    debug!("🛒️ Removed {} items from cart {cart_id}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Deletes the cart lines consumed by an order. This is a hard remove; the items have become order details.
pub async fn consume_cart_items(
    cart_id: i64,
    product_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<(), ShopDatabaseError> {
    for product_id in product_ids {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
