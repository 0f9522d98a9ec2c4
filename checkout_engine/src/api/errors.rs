use thiserror::Error;

use crate::{
    db_types::{OrderStatus, PaymentStatus},
    traits::{GatewayError, ShopDatabaseError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Could not complete the request: {0}")]
    DatabaseError(#[from] ShopDatabaseError),
    #[error("The payment gateway call failed: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Order {order_id} is {status} and cannot accept a new payment")]
    OrderNotPayable { order_id: i64, status: OrderStatus },
    #[error("Order {0} has a non-positive total and cannot be paid")]
    NonPositiveTotal(i64),
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(i64),
    #[error("Payment {payment_id} is {status} and cannot be cancelled")]
    PaymentNotCancellable { payment_id: i64, status: PaymentStatus },
}
