//! Checkout Engine
//!
//! The checkout engine contains the core logic of the marketplace purchase pipeline: carts, orders with atomic
//! stock reservation, and payment attempts reconciled against an external payment gateway. It is provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the [`mod@db_types`] module and are public.
//! 2. The engine public API. [`CartApi`] covers all pre-checkout cart manipulation and [`OrderFlowApi`] covers the
//!    order and payment flows. Storage backends implement
//!    [`traits::ShopDatabase`] and gateway clients implement [`traits::PaymentGateway`] to plug into these APIs.
mod api;

pub mod db_types;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    cart_api::CartApi,
    cart_objects::{CartLine, CartView},
    errors::CheckoutError,
    order_flow_api::OrderFlowApi,
    order_objects::{CheckoutResult, OrderWithDetails},
};
