//! A minimal client for the PayOS payment gateway.
//!
//! The client covers the four calls the checkout flow needs: creating a hosted checkout link, polling a link's
//! status, cancelling a link, and authenticating webhook payloads. Every request and webhook is signed with
//! HMAC-SHA256 over the merchant's checksum key, per the PayOS API contract.
//!
//! The crate knows nothing about carts or orders; it speaks the gateway's wire format and nothing else.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;

pub use api::PayOsApi;
pub use config::PayOsConfig;
pub use data_objects::{
    CheckoutData,
    PaymentItem,
    PaymentLinkData,
    PaymentLinkRequest,
    PayOsResponse,
    WebhookData,
    WebhookPayload,
    SUCCESS_CODE,
};
pub use error::PayOsApiError;
pub use helpers::{hmac_sha256_hex, request_signature, webhook_signature};
