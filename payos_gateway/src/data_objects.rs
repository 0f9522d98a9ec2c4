use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::request_signature;

/// The response code PayOS uses for "everything went fine", on API responses and webhooks alike.
pub const SUCCESS_CODE: &str = "00";

/// One line item on the hosted checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentItem {
    pub name: String,
    pub quantity: i64,
    pub price: i64,
}

/// The caller-facing shape of a create-payment-link call. [`PayOsApi`](crate::PayOsApi) signs it and fills in the
/// wire format.
#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub items: Vec<PaymentItem>,
    pub return_url: String,
    pub cancel_url: String,
}

impl PaymentLinkRequest {
    /// Produce the signed wire-format body. The signature covers the five core fields only, per the PayOS contract.
    pub fn into_signed(self, checksum_key: &str) -> SignedPaymentLinkRequest {
        let signature = request_signature(
            checksum_key,
            self.amount,
            &self.cancel_url,
            &self.description,
            self.order_code,
            &self.return_url,
        );
        SignedPaymentLinkRequest {
            order_code: self.order_code,
            amount: self.amount,
            description: self.description,
            items: self.items,
            return_url: self.return_url,
            cancel_url: self.cancel_url,
            signature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPaymentLinkRequest {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub items: Vec<PaymentItem>,
    pub return_url: String,
    pub cancel_url: String,
    pub signature: String,
}

/// The envelope every PayOS API response arrives in.
#[derive(Debug, Clone, Deserialize)]
pub struct PayOsResponse<T> {
    pub code: String,
    pub desc: String,
    pub data: Option<T>,
    pub signature: Option<String>,
}

/// The payload of a successful create-payment-link call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub payment_link_id: String,
    pub status: String,
    pub checkout_url: String,
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// The payload of a get-payment-link-information or cancel call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkData {
    pub id: String,
    pub order_code: i64,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_remaining: i64,
    pub status: String,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

/// The envelope of a webhook delivery. `data` stays opaque until the signature over it has been checked.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub code: String,
    pub desc: String,
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Value,
    pub signature: String,
}

/// The authenticated content of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    pub order_code: i64,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub payment_link_id: String,
    /// The per-transaction result code; `"00"` means the money moved.
    pub code: String,
    #[serde(default)]
    pub desc: String,
}
