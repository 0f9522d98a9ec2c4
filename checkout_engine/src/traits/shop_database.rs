use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::Money;
use thiserror::Error;

use crate::db_types::{Cart, CartItem, NewOrder, Order, OrderDetail, Payment, PaymentProvider, PaymentStatus, Product};

/// Search criteria for the admin payment listing. Empty filter returns everything, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentQueryFilter {
    pub status: Option<PaymentStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl PaymentQueryFilter {
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.since.is_none() && self.until.is_none()
    }
}

/// The storage contract for the checkout engine.
///
/// Backends must guarantee:
/// * Order creation (stock re-validation, stock decrement, order + detail insert, cart-item removal) commits as a
///   single transaction. A failure in any sub-step leaves no stock decremented and no order row behind.
/// * At most one `Pending` payment row per order, even under concurrent inserts.
/// * The terminal payment transitions (`settle_payment`, `void_payment`) are idempotent: re-applying a state the
///   payment is already in succeeds without side effects.
#[allow(async_fn_in_trait)]
pub trait ShopDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    // ----------------------------------------- Products ----------------------------------------------------------

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, ShopDatabaseError>;

    // ----------------------------------------- Carts -------------------------------------------------------------

    async fn fetch_cart_for_customer(&self, customer_id: i64) -> Result<Option<Cart>, ShopDatabaseError>;

    /// Fetch the customer's cart, creating an empty one if none exists yet.
    async fn fetch_or_create_cart(&self, customer_id: i64) -> Result<Cart, ShopDatabaseError>;

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, ShopDatabaseError>;

    /// Add `quantity` of the product to the customer's cart, creating the cart and/or incrementing an existing line
    /// as needed. Fails with [`ShopDatabaseError::InsufficientStock`] when the requested quantity exceeds the live
    /// on-hand quantity. Stock is *not* reserved here.
    async fn add_cart_item(&self, customer_id: i64, product_id: i64, quantity: i64)
        -> Result<CartItem, ShopDatabaseError>;

    /// Set the quantity of a cart line. A quantity of zero or less removes the line and returns `None`.
    async fn set_cart_item_quantity(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, ShopDatabaseError>;

    async fn remove_cart_item(&self, cart_id: i64, product_id: i64) -> Result<(), ShopDatabaseError>;

    /// Toggle the "selected for checkout" flag on one line.
    async fn set_cart_item_selected(
        &self,
        cart_id: i64,
        product_id: i64,
        selected: bool,
    ) -> Result<CartItem, ShopDatabaseError>;

    /// Toggle the "selected for checkout" flag on every line. Returns the number of lines touched.
    async fn set_all_cart_items_selected(&self, cart_id: i64, selected: bool) -> Result<u64, ShopDatabaseError>;

    /// Remove every line from the cart. Returns the number of lines removed.
    async fn clear_cart(&self, cart_id: i64) -> Result<u64, ShopDatabaseError>;

    // ----------------------------------------- Orders ------------------------------------------------------------

    /// Convert the customer's selected cart lines into an order, in a single atomic transaction:
    /// re-validate stock per line, decrement the stock ledger, insert the order with frozen detail snapshots
    /// (unit price = current product price), and hard-remove the consumed cart lines.
    ///
    /// If no lines are selected, *all* lines are treated as selected (auto-select fallback).
    ///
    /// Insufficient stock on any line aborts the entire order.
    async fn create_order_from_cart(
        &self,
        customer_id: i64,
        order: NewOrder,
    ) -> Result<(Order, Vec<OrderDetail>), ShopDatabaseError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, ShopDatabaseError>;

    async fn fetch_order_details(&self, order_id: i64) -> Result<Vec<OrderDetail>, ShopDatabaseError>;

    // ----------------------------------------- Payments ----------------------------------------------------------

    /// Insert a new `Pending` payment attempt for the order. The backend enforces the one-pending-payment-per-order
    /// invariant; a concurrent duplicate surfaces as [`ShopDatabaseError::DuplicatePendingPayment`].
    async fn insert_pending_payment(
        &self,
        order_id: i64,
        amount: Money,
        provider: PaymentProvider,
    ) -> Result<Payment, ShopDatabaseError>;

    /// Store the gateway's transaction id, checkout URL and raw response on the payment row after a successful
    /// create-checkout-link call.
    async fn attach_gateway_details(
        &self,
        payment_id: i64,
        txid: &str,
        checkout_url: &str,
        raw_response: &str,
    ) -> Result<Payment, ShopDatabaseError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, ShopDatabaseError>;

    async fn fetch_payment_by_txid(&self, txid: &str) -> Result<Option<Payment>, ShopDatabaseError>;

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, ShopDatabaseError>;

    async fn search_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, ShopDatabaseError>;

    /// Mark the payment `Completed` and drive its order to `Completed` (setting `completed_at`), in one
    /// transaction.
    ///
    /// Idempotent: an already-`Completed` payment returns `(payment, false)` untouched. A `Cancelled` payment
    /// cannot be completed and returns [`ShopDatabaseError::InvalidStateChange`].
    async fn settle_payment(&self, payment_id: i64, raw_response: &str)
        -> Result<(Payment, bool), ShopDatabaseError>;

    /// Mark the payment `Cancelled` and drive its order to `Cancelled` (setting `cancellation_reason`), in one
    /// transaction.
    ///
    /// Idempotent: an already-`Cancelled` payment returns `(payment, false)` untouched. A `Completed` payment
    /// cannot be cancelled and returns [`ShopDatabaseError::InvalidStateChange`].
    async fn void_payment(
        &self,
        payment_id: i64,
        reason: &str,
        raw_response: &str,
    ) -> Result<(Payment, bool), ShopDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), ShopDatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShopDatabaseError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("No cart exists for customer {0}")]
    CartNotFound(i64),
    #[error("The cart has no items")]
    EmptyCart,
    #[error("Product {product_id} is not in the cart")]
    ItemNotInCart { product_id: i64 },
    #[error("Insufficient stock for '{product_name}': requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, product_name: String, requested: i64, available: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("No payment exists for transaction id {0}")]
    PaymentTxidNotFound(String),
    #[error("Order {0} already has a pending payment. Complete or cancel it first")]
    DuplicatePendingPayment(i64),
    #[error("Payment {payment_id} cannot move from {from} to {to}")]
    InvalidStateChange { payment_id: i64, from: PaymentStatus, to: PaymentStatus },
}

impl From<sqlx::Error> for ShopDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        ShopDatabaseError::DatabaseError(e.to_string())
    }
}
