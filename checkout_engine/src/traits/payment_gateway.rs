use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shop_common::Money;
use thiserror::Error;

use crate::db_types::{OrderDetail, PaymentProvider};

/// The longest description the gateway accepts on a checkout link.
pub const MAX_DESCRIPTION_LENGTH: usize = 25;

/// One line item as presented to the gateway's checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<&OrderDetail> for CheckoutItem {
    fn from(detail: &OrderDetail) -> Self {
        Self { name: detail.product_name.clone(), quantity: detail.quantity, unit_price: detail.unit_price }
    }
}

/// Everything the gateway needs to issue a checkout link.
///
/// `order_code` is a gateway-facing numeric code, unique per gateway account. It is derived from a time-based
/// generator rather than the order's own id, because the gateway imposes its own id-format constraints.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_code: i64,
    pub amount: Money,
    pub description: String,
    pub items: Vec<CheckoutItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Where the gateway's hosted page sends the shopper after checkout. Set once from server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl RedirectUrls {
    pub fn new<S: Into<String>>(success_url: S, cancel_url: S) -> Self {
        Self { success_url: success_url.into(), cancel_url: cancel_url.into() }
    }
}

/// The gateway's answer to a successful create-checkout-link call.
#[derive(Debug, Clone)]
pub struct CheckoutLink {
    pub transaction_id: String,
    pub checkout_url: String,
    pub raw_response: String,
}

/// A payment state as the gateway reports it. This is deliberately coarser than [`crate::db_types::PaymentStatus`]:
/// only `Paid` and `Cancelled` drive local transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayPaymentState {
    Pending,
    Processing,
    Paid,
    Cancelled,
    Expired,
}

impl GatewayPaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GatewayPaymentState::Paid | GatewayPaymentState::Cancelled | GatewayPaymentState::Expired)
    }
}

impl Display for GatewayPaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayPaymentState::Pending => write!(f, "PENDING"),
            GatewayPaymentState::Processing => write!(f, "PROCESSING"),
            GatewayPaymentState::Paid => write!(f, "PAID"),
            GatewayPaymentState::Cancelled => write!(f, "CANCELLED"),
            GatewayPaymentState::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl std::str::FromStr for GatewayPaymentState {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            s => Err(GatewayError::InvalidPayload(format!("Unknown gateway payment state: {s}"))),
        }
    }
}

/// Result of a status poll against the gateway.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: GatewayPaymentState,
    pub raw_response: String,
}

/// Result of a cancel call against the gateway.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub raw_response: String,
}

/// The normalised reconciliation message. Both webhook shapes (POST body and GET query parameters) and the status
/// poll converge onto this one type before the shared transition logic runs.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub transaction_id: String,
    pub order_code: i64,
    pub status: GatewayPaymentState,
    pub raw: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The gateway call timed out")]
    Timeout,
    #[error("The gateway request failed. {0}")]
    RequestFailed(String),
    #[error("The gateway rejected the request. code={code}, desc={desc}")]
    Rejected { code: String, desc: String },
    #[error("The webhook payload signature is invalid")]
    InvalidSignature,
    #[error("The gateway payload could not be interpreted. {0}")]
    InvalidPayload(String),
}

/// A thin client for one external payment provider.
///
/// Implementations are selected by the [`PaymentProvider`] tag stored on the payment row; the engine never cares
/// which concrete provider sits behind the trait.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// The provider tag this gateway serves.
    fn provider(&self) -> PaymentProvider;

    /// Ask the gateway for a hosted checkout page for the given request.
    async fn create_checkout_link(&self, request: CheckoutRequest) -> Result<CheckoutLink, GatewayError>;

    /// Poll the gateway for the current state of a transaction.
    async fn query_status(&self, transaction_id: &str) -> Result<StatusSnapshot, GatewayError>;

    /// Cancel an open checkout link at the gateway.
    async fn cancel(&self, transaction_id: &str, reason: &str) -> Result<CancelOutcome, GatewayError>;

    /// Authenticate a raw webhook payload and normalise it into a [`PaymentUpdate`].
    ///
    /// Returns [`GatewayError::InvalidSignature`] when the payload cannot be authenticated. Verification is
    /// synchronous since it is pure HMAC arithmetic over the payload.
    fn verify_webhook(&self, raw_payload: &str) -> Result<PaymentUpdate, GatewayError>;
}
