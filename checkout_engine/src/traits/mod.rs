//! Interface contracts of the checkout engine.
//!
//! Two seams are defined here:
//!
//! * [`ShopDatabase`] is the contract a storage backend must fulfil: cart state, the atomic order-creation
//!   transaction, and the idempotent payment/order reconciliation transitions. The SQLite backend in
//!   [`crate::sqlite`] is the only implementation in-tree.
//! * [`PaymentGateway`] is the contract for an external payment provider: issue checkout links, report payment
//!   status, cancel links, and authenticate webhook payloads. The concrete implementation lives with the server
//!   binary, keeping this crate provider-agnostic.
mod payment_gateway;
mod shop_database;

pub use payment_gateway::{
    CancelOutcome,
    CheckoutItem,
    CheckoutLink,
    CheckoutRequest,
    GatewayError,
    GatewayPaymentState,
    PaymentGateway,
    PaymentUpdate,
    RedirectUrls,
    StatusSnapshot,
    MAX_DESCRIPTION_LENGTH,
};
pub use shop_database::{PaymentQueryFilter, ShopDatabase, ShopDatabaseError};
