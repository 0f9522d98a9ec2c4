use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      Product        ---------------------------------------------------------
/// A row in the product store. The `quantity` column is the authoritative stock ledger: it is decremented at order
/// creation only, never by cart mutations.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Cart         ---------------------------------------------------------
/// A customer's pre-checkout collection of candidate purchases. At most one cart exists per customer; it is created
/// lazily on the first add.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// The "selected for checkout" flag. Unselected items stay in the cart when an order is created.
    pub selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order has been created, but payment has not cleared yet.
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    /// Payment has been confirmed by the gateway. Only payment reconciliation sets this.
    Completed,
    /// The order was cancelled, either by the customer or via a gateway-reported cancellation.
    Cancelled,
    Refunded,
    Disputed,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Disputed => "Disputed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            "Disputed" => Ok(Self::Disputed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// An order is an immutable snapshot of the checked-out cart lines. Once created, its details and prices never
/// change; only `status`, `completed_at` and `cancellation_reason` mutate, and then only via payment reconciliation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub ship_address: String,
    /// Human-readable label of the payment provider chosen at checkout.
    pub payment_method: String,
    /// Sum of the line totals, frozen at the moment of creation.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

//--------------------------------------     OrderDetail     ---------------------------------------------------------
/// A single line of an order. `product_name` and `unit_price` are captured at order time so that later product
/// mutations cannot alter what was sold.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// The caller-supplied portion of a new order. The line items come from the customer's cart, not from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub ship_address: String,
    pub provider: PaymentProvider,
}

impl NewOrder {
    pub fn new<S: Into<String>>(ship_address: S, provider: PaymentProvider) -> Self {
        Self { ship_address: ship_address.into(), provider }
    }
}

//--------------------------------------   PaymentProvider   ---------------------------------------------------------
/// Tag identifying the external gateway a payment runs through. Concrete gateway implementations are selected by
/// this tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentProvider {
    #[default]
    PayOs,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProvider::PayOs => write!(f, "PayOs"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PayOs" => Ok(Self::PayOs),
            s => Err(ConversionError(format!("Invalid payment provider: {s}"))),
        }
    }
}

impl From<String> for PaymentProvider {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid payment provider: {value}. But this conversion cannot fail. Defaulting to PayOs");
            PaymentProvider::PayOs
        })
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The attempt exists locally; the gateway has not reported a terminal outcome yet.
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    /// Terminal payments never change again; a new attempt against the order is required instead.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Cancelled)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
/// One payment attempt against an order. An order accumulates several of these across cancel/retry cycles, but only
/// one may be `Pending` at a time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    /// Always equal to the order's total at the time the attempt was created.
    pub amount: Money,
    pub provider: PaymentProvider,
    pub status: PaymentStatus,
    /// The gateway's transaction id. Absent until the create-checkout-link call succeeds.
    pub txid: Option<String>,
    pub checkout_url: Option<String>,
    /// The last raw gateway response, stored opaquely for audit and replay.
    pub gateway_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
