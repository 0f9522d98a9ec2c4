//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`ShopDatabase`] trait. The concurrency story
//! leans entirely on SQLite transactions: the order-creation flow and both terminal payment transitions each run
//! inside a single transaction, and the partial unique index on pending payments closes the duplicate-payment race.
//!
//! Every mutation goes through an explicit `begin()`/`commit()`, including the single-statement ones. A statement
//! running in an implicit transaction is not guaranteed to be committed by the time the call returns, so a read on
//! another pool connection can miss the row. The explicit commit makes the write visible to every connection before
//! the method returns.
use std::fmt::Debug;

use log::*;
use shop_common::Money;
use sqlx::SqlitePool;

use super::db::{carts, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{Cart, CartItem, NewOrder, Order, OrderDetail, Payment, PaymentProvider, PaymentStatus, Product},
    traits::{PaymentQueryFilter, ShopDatabase, ShopDatabaseError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ShopDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_cart_for_customer(&self, customer_id: i64) -> Result<Option<Cart>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart_for_customer(customer_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_or_create_cart(&self, customer_id: i64) -> Result<Cart, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_or_create_cart(customer_id, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(cart_id, &mut conn).await?;
        Ok(items)
    }

    /// Adds an item to the customer's cart in a single transaction: the stock check and the upsert see the same
    /// snapshot. Stock is only *checked* here, not reserved; the order-creation transaction is the sole reservation
    /// gate.
    async fn add_cart_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let product = products::fetch_product(product_id, &mut tx)
            .await?
            .ok_or(ShopDatabaseError::ProductNotFound(product_id))?;
        if product.quantity < quantity {
            return Err(ShopDatabaseError::InsufficientStock {
                product_id,
                product_name: product.name,
                requested: quantity,
                available: product.quantity,
            });
        }
        let cart = carts::fetch_or_create_cart(customer_id, &mut tx).await?;
        let item = carts::upsert_cart_item(cart.id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🛒️ Added {quantity} x product {product_id} to cart {} for customer {customer_id}", cart.id);
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        if quantity <= 0 {
            carts::delete_cart_item(cart_id, product_id, &mut tx).await?;
            tx.commit().await?;
            debug!("🛒️ Quantity {quantity} removed product {product_id} from cart {cart_id}");
            return Ok(None);
        }
        let item = carts::set_quantity(cart_id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(item))
    }

    async fn remove_cart_item(&self, cart_id: i64, product_id: i64) -> Result<(), ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        carts::delete_cart_item(cart_id, product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_cart_item_selected(
        &self,
        cart_id: i64,
        product_id: i64,
        selected: bool,
    ) -> Result<CartItem, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let item = carts::set_selected(cart_id, product_id, selected, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn set_all_cart_items_selected(&self, cart_id: i64, selected: bool) -> Result<u64, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let n = carts::set_all_selected(cart_id, selected, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }

    async fn clear_cart(&self, cart_id: i64) -> Result<u64, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let n = carts::clear_cart(cart_id, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }

    /// The checkout transaction. Everything from the stock re-validation to the cart cleanup commits as one unit;
    /// any failure (including insufficient stock on the last line) rolls the whole order back, so stock is never
    /// decremented without a matching order row.
    async fn create_order_from_cart(
        &self,
        customer_id: i64,
        order: NewOrder,
    ) -> Result<(Order, Vec<OrderDetail>), ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_cart_for_customer(customer_id, &mut tx)
            .await?
            .ok_or(ShopDatabaseError::CartNotFound(customer_id))?;
        let all_items = carts::fetch_cart_items(cart.id, &mut tx).await?;
        if all_items.is_empty() {
            return Err(ShopDatabaseError::EmptyCart);
        }
        // Auto-select fallback: nothing selected means everything is selected
        let selected: Vec<_> = match all_items.iter().any(|i| i.selected) {
            true => all_items.into_iter().filter(|i| i.selected).collect(),
            false => {
                debug!("🛒️ No items selected in cart {}. Auto-selecting all {} items", cart.id, all_items.len());
                all_items
            },
        };
        // Re-validate and reserve stock per line. This is the sole stock-reservation gate in the system.
        let mut lines = Vec::with_capacity(selected.len());
        for item in &selected {
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(ShopDatabaseError::ProductNotFound(item.product_id))?;
            if product.quantity < item.quantity || !products::decrement_stock(item.product_id, item.quantity, &mut tx).await? {
                return Err(ShopDatabaseError::InsufficientStock {
                    product_id: item.product_id,
                    product_name: product.name,
                    requested: item.quantity,
                    available: product.quantity,
                });
            }
            lines.push((product, item.quantity));
        }
        let total: Money = lines.iter().map(|(p, qty)| p.price * *qty).sum();
        let order = orders::insert_order(
            customer_id,
            &order.ship_address,
            &order.provider.to_string(),
            total,
            &mut tx,
        )
        .await?;
        let mut details = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let detail =
                orders::insert_order_detail(order.id, product.id, &product.name, *quantity, product.price, &mut tx)
                    .await?;
            details.push(detail);
        }
        let consumed: Vec<i64> = selected.iter().map(|i| i.product_id).collect();
        carts::consume_cart_items(cart.id, &consumed, &mut tx).await?;
        tx.commit().await?;
        info!("📦️ Order {} created for customer {customer_id} with {} lines, total {total}", order.id, details.len());
        Ok((order, details))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_details(&self, order_id: i64) -> Result<Vec<OrderDetail>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let details = orders::fetch_order_details(order_id, &mut conn).await?;
        Ok(details)
    }

    async fn insert_pending_payment(
        &self,
        order_id: i64,
        amount: Money,
        provider: PaymentProvider,
    ) -> Result<Payment, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_pending_payment(order_id, amount, provider, &mut tx).await?;
        tx.commit().await?;
        debug!("💳️ Payment {} created for order {order_id} ({amount})", payment.id);
        Ok(payment)
    }

    async fn attach_gateway_details(
        &self,
        payment_id: i64,
        txid: &str,
        checkout_url: &str,
        raw_response: &str,
    ) -> Result<Payment, ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::attach_gateway_details(payment_id, txid, checkout_url, raw_response, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_txid(&self, txid: &str) -> Result<Option<Payment>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_txid(txid, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let list = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(list)
    }

    async fn search_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, ShopDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let list = payments::search_payments(filter, &mut conn).await?;
        Ok(list)
    }

    /// The idempotent "payment confirmed" transition. Webhooks are delivered at least once and race the status
    /// poll, so a second application of the same terminal state must be a silent no-op.
    async fn settle_payment(
        &self,
        payment_id: i64,
        raw_response: &str,
    ) -> Result<(Payment, bool), ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment(payment_id, &mut tx)
            .await?
            .ok_or(ShopDatabaseError::PaymentNotFound(payment_id))?;
        match payment.status {
            PaymentStatus::Completed => {
                debug!("💳️ Payment {payment_id} is already Completed. No action to take");
                return Ok((payment, false));
            },
            PaymentStatus::Cancelled => {
                return Err(ShopDatabaseError::InvalidStateChange {
                    payment_id,
                    from: PaymentStatus::Cancelled,
                    to: PaymentStatus::Completed,
                });
            },
            PaymentStatus::Pending => {},
        }
        let payment = payments::update_payment_status(payment_id, PaymentStatus::Completed, raw_response, &mut tx).await?;
        orders::mark_order_completed(payment.order_id, &mut tx).await?;
        tx.commit().await?;
        info!("💳️ Payment {payment_id} settled. Order {} is Completed", payment.order_id);
        Ok((payment, true))
    }

    /// The idempotent "payment cancelled" transition, mirroring [`Self::settle_payment`].
    async fn void_payment(
        &self,
        payment_id: i64,
        reason: &str,
        raw_response: &str,
    ) -> Result<(Payment, bool), ShopDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment(payment_id, &mut tx)
            .await?
            .ok_or(ShopDatabaseError::PaymentNotFound(payment_id))?;
        match payment.status {
            PaymentStatus::Cancelled => {
                debug!("💳️ Payment {payment_id} is already Cancelled. No action to take");
                return Ok((payment, false));
            },
            PaymentStatus::Completed => {
                return Err(ShopDatabaseError::InvalidStateChange {
                    payment_id,
                    from: PaymentStatus::Completed,
                    to: PaymentStatus::Cancelled,
                });
            },
            PaymentStatus::Pending => {},
        }
        let payment = payments::update_payment_status(payment_id, PaymentStatus::Cancelled, raw_response, &mut tx).await?;
        orders::mark_order_cancelled(payment.order_id, reason, &mut tx).await?;
        tx.commit().await?;
        info!("💳️ Payment {payment_id} voided. Order {} is Cancelled ({reason})", payment.order_id);
        Ok((payment, true))
    }

    async fn close(&mut self) -> Result<(), ShopDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
