use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderDetail, Payment};

/// An order together with its frozen line snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithDetails {
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

/// The result of the composite checkout call: the committed order plus the payment attempt carrying the gateway
/// checkout URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub details: Vec<OrderDetail>,
    pub payment: Payment,
}
