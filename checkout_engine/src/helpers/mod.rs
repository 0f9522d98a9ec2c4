//! Small, self-contained helper functions used across the engine.
mod order_code;

pub use order_code::{bounded_description, new_order_code};
