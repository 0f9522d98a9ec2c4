//! # Marketplace checkout server
//! This module hosts the HTTP front-end for the checkout engine. It is responsible for:
//! * the cart, order and payment routes,
//! * receiving webhook and return-callback requests from the PayOS gateway,
//! * mapping engine errors onto HTTP status codes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! All business rules live in `checkout_engine`; the handlers here stay thin.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod payos_routes;
pub mod routes;
pub mod server;
