use std::fmt::Debug;

use log::*;

use crate::{
    api::{
        errors::CheckoutError,
        order_objects::{CheckoutResult, OrderWithDetails},
    },
    db_types::{NewOrder, Order, OrderStatus, Payment, PaymentProvider, PaymentStatus},
    helpers::{bounded_description, new_order_code},
    traits::{
        CheckoutRequest,
        GatewayPaymentState,
        PaymentGateway,
        PaymentQueryFilter,
        PaymentUpdate,
        RedirectUrls,
        ShopDatabase,
        ShopDatabaseError,
    },
};

/// `OrderFlowApi` is the primary API for the purchase pipeline: converting carts into orders, initiating payments
/// against the external gateway, and reconciling gateway outcomes (push via webhook, pull via status poll) back onto
/// local state.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    redirects: RedirectUrls,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, redirects: RedirectUrls) -> Self {
        Self { db, gateway, redirects }
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: ShopDatabase,
    G: PaymentGateway,
{
    // ----------------------------------------- Order creation ----------------------------------------------------

    /// Convert the customer's selected cart lines into an order. The entire conversion (stock re-validation, stock
    /// decrement, order + detail insert, cart cleanup) is one transaction in the backend.
    pub async fn create_order_from_cart(
        &self,
        customer_id: i64,
        order: NewOrder,
    ) -> Result<OrderWithDetails, CheckoutError> {
        let (order, details) = self.db.create_order_from_cart(customer_id, order).await?;
        Ok(OrderWithDetails { order, details })
    }

    pub async fn order_with_details(&self, order_id: i64) -> Result<OrderWithDetails, CheckoutError> {
        let order = self.fetch_order(order_id).await?;
        let details = self.db.fetch_order_details(order_id).await?;
        Ok(OrderWithDetails { order, details })
    }

    // ----------------------------------------- Payment initiation ------------------------------------------------

    /// Create a pending payment for the order and ask the gateway for a hosted checkout link.
    ///
    /// Preconditions, checked in order: the order exists, is `Pending`, has a positive total, has no `Completed`
    /// payment, and has no `Pending` payment. The partial unique index in the backend closes the race between the
    /// last check and the insert.
    ///
    /// If the gateway call fails, the pending payment row stays behind with no txid and the error propagates.
    /// Nothing is rolled back: recovery is an explicit [`Self::cancel_payment`] followed by a new attempt.
    pub async fn create_payment_link(&self, order_id: i64) -> Result<Payment, CheckoutError> {
        let order = self.fetch_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPayable { order_id, status: order.status });
        }
        if !order.total_amount.is_positive() {
            return Err(CheckoutError::NonPositiveTotal(order_id));
        }
        let attempts = self.db.fetch_payments_for_order(order_id).await?;
        if attempts.iter().any(|p| p.status == PaymentStatus::Completed) {
            return Err(CheckoutError::OrderAlreadyPaid(order_id));
        }
        if attempts.iter().any(|p| p.status == PaymentStatus::Pending) {
            return Err(ShopDatabaseError::DuplicatePendingPayment(order_id).into());
        }
        let provider = PaymentProvider::from(order.payment_method.clone());
        let payment = self.db.insert_pending_payment(order_id, order.total_amount, provider).await?;
        let details = self.db.fetch_order_details(order_id).await?;
        let request = CheckoutRequest {
            order_code: new_order_code(),
            amount: order.total_amount,
            description: bounded_description(&format!("Order #{order_id}")),
            items: details.iter().map(Into::into).collect(),
            success_url: self.redirects.success_url.clone(),
            cancel_url: self.redirects.cancel_url.clone(),
        };
        match self.gateway.create_checkout_link(request).await {
            Ok(link) => {
                let payment = self
                    .db
                    .attach_gateway_details(payment.id, &link.transaction_id, &link.checkout_url, &link.raw_response)
                    .await?;
                info!("💳️ Checkout link issued for order {order_id} (txid {})", link.transaction_id);
                Ok(payment)
            },
            Err(e) => {
                warn!(
                    "💳️ Gateway refused a checkout link for order {order_id}: {e}. Payment {} stays Pending with no \
                     txid; cancel it before retrying",
                    payment.id
                );
                Err(e.into())
            },
        }
    }

    /// Create the order and immediately initiate payment for it. The order creation commits on its own, so a
    /// subsequent gateway failure leaves a valid order (and a pending payment) behind while the error propagates.
    pub async fn checkout_from_cart(
        &self,
        customer_id: i64,
        order: NewOrder,
    ) -> Result<CheckoutResult, CheckoutError> {
        let OrderWithDetails { order, details } = self.create_order_from_cart(customer_id, order).await?;
        let payment = self.create_payment_link(order.id).await?;
        Ok(CheckoutResult { order, details, payment })
    }

    // ----------------------------------------- Reconciliation ----------------------------------------------------

    /// Handle a signed webhook payload pushed by the gateway.
    ///
    /// Every failure mode (bad signature, unknown transaction, invalid transition) is logged and swallowed; the HTTP
    /// boundary acknowledges the delivery regardless, since the gateway retries on anything else and the poll path
    /// recovers missed updates anyway. Returns the payment when an update was applied.
    pub async fn process_webhook(&self, raw_payload: &str) -> Option<Payment> {
        let update = match self.gateway.verify_webhook(raw_payload) {
            Ok(update) => update,
            Err(e) => {
                warn!("💳️ Webhook payload rejected: {e}");
                return None;
            },
        };
        self.apply_update(update).await
    }

    /// Handle the GET-style return callback, carrying `orderCode`, `status` and `code` query parameters.
    ///
    /// This entry point is unauthenticated, so it is treated as a hint only. A successful PAID (`status == "PAID"`
    /// and `code == "00"`) settles and an explicit CANCELLED (or a non-`00` result code) voids; every other status
    /// is in flight and must not touch the payment, since the customer landing back on the return page with the
    /// payment still PENDING is routine and the signed webhook (or the poll) delivers the real outcome later.
    /// It normalises into the same [`PaymentUpdate`] the webhook path uses.
    pub async fn process_callback(&self, order_code: i64, status: &str, code: &str) -> Option<Payment> {
        let state = if status == "PAID" && code == "00" {
            GatewayPaymentState::Paid
        } else if status == "CANCELLED" || code != "00" {
            GatewayPaymentState::Cancelled
        } else {
            status.parse().unwrap_or(GatewayPaymentState::Pending)
        };
        let update = PaymentUpdate {
            transaction_id: order_code.to_string(),
            order_code,
            status: state,
            raw: format!("orderCode={order_code}&status={status}&code={code}"),
        };
        self.apply_update(update).await
    }

    /// The shared transition logic behind both reconciliation entry points.
    async fn apply_update(&self, update: PaymentUpdate) -> Option<Payment> {
        let txid = update.transaction_id.as_str();
        let payment = match self.db.fetch_payment_by_txid(txid).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                warn!("💳️ Gateway update for unknown transaction {txid}. Dropping it");
                return None;
            },
            Err(e) => {
                error!("💳️ Could not look up transaction {txid}: {e}");
                return None;
            },
        };
        let result = match update.status {
            GatewayPaymentState::Paid => self.db.settle_payment(payment.id, &update.raw).await,
            GatewayPaymentState::Cancelled | GatewayPaymentState::Expired => {
                let reason = format!("Payment {} at the gateway", update.status);
                self.db.void_payment(payment.id, &reason, &update.raw).await
            },
            state => {
                trace!("💳️ Non-terminal gateway state {state} for transaction {txid}. Nothing to do");
                return Some(payment);
            },
        };
        match result {
            Ok((payment, true)) => {
                info!("💳️ Transaction {txid} reconciled to {}", payment.status);
                Some(payment)
            },
            Ok((payment, false)) => {
                debug!("💳️ Transaction {txid} was already {}. Redelivery ignored", payment.status);
                Some(payment)
            },
            Err(e) => {
                error!("💳️ Could not apply gateway update for transaction {txid}: {e}");
                None
            },
        }
    }

    // ----------------------------------------- Status queries ----------------------------------------------------

    /// The current payment status, opportunistically synced against the gateway.
    ///
    /// Terminal payments are returned as stored. A `Pending` payment with a txid triggers a gateway poll; a terminal
    /// gateway state applies the same transition as the webhook path before returning. A gateway error during the
    /// sync is logged and the stored status returned, so the read never fails because the gateway hiccuped.
    pub async fn payment_status(&self, payment_id: i64) -> Result<PaymentStatus, CheckoutError> {
        let payment = self.fetch_payment(payment_id).await?;
        if payment.is_terminal() {
            return Ok(payment.status);
        }
        let Some(txid) = payment.txid.as_deref() else {
            return Ok(payment.status);
        };
        let snapshot = match self.gateway.query_status(txid).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("💳️ Status sync for payment {payment_id} failed: {e}. Returning the stored status");
                return Ok(payment.status);
            },
        };
        let (payment, _) = match snapshot.status {
            GatewayPaymentState::Paid => self.db.settle_payment(payment_id, &snapshot.raw_response).await?,
            GatewayPaymentState::Cancelled | GatewayPaymentState::Expired => {
                let reason = format!("Payment {} at the gateway", snapshot.status);
                self.db.void_payment(payment_id, &reason, &snapshot.raw_response).await?
            },
            _ => return Ok(payment.status),
        };
        Ok(payment.status)
    }

    /// The stored payment status. No gateway call, no mutation.
    pub async fn payment_status_local(&self, payment_id: i64) -> Result<PaymentStatus, CheckoutError> {
        let payment = self.fetch_payment(payment_id).await?;
        Ok(payment.status)
    }

    /// Look up a payment by its gateway-facing order code.
    pub async fn payment_by_order_code(&self, order_code: i64) -> Result<Payment, CheckoutError> {
        let txid = order_code.to_string();
        let payment = self
            .db
            .fetch_payment_by_txid(&txid)
            .await?
            .ok_or(ShopDatabaseError::PaymentTxidNotFound(txid))?;
        Ok(payment)
    }

    // ----------------------------------------- Cancellation ------------------------------------------------------

    /// Cancel a pending payment, gateway first.
    ///
    /// A gateway failure is a hard error and leaves local state untouched; the caller can retry. Only once the
    /// gateway acknowledges the cancellation do the payment and its order move to `Cancelled`. A payment whose link
    /// was never issued (no txid) is voided locally without a gateway call.
    pub async fn cancel_payment(&self, payment_id: i64, reason: &str) -> Result<Payment, CheckoutError> {
        let payment = self.fetch_payment(payment_id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(CheckoutError::PaymentNotCancellable { payment_id, status: payment.status });
        }
        let raw = match payment.txid.as_deref() {
            Some(txid) => self.gateway.cancel(txid, reason).await?.raw_response,
            None => String::new(),
        };
        let (payment, _) = self.db.void_payment(payment_id, reason, &raw).await?;
        info!("💳️ Payment {payment_id} cancelled ({reason})");
        Ok(payment)
    }

    // ----------------------------------------- Listings -----------------------------------------------------------

    pub async fn payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, CheckoutError> {
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        Ok(payments)
    }

    pub async fn search_payments(&self, filter: PaymentQueryFilter) -> Result<Vec<Payment>, CheckoutError> {
        let payments = self.db.search_payments(filter).await?;
        Ok(payments)
    }

    // ----------------------------------------- Internal helpers --------------------------------------------------

    async fn fetch_order(&self, order_id: i64) -> Result<Order, CheckoutError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(ShopDatabaseError::OrderNotFound(order_id))?;
        Ok(order)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, CheckoutError> {
        let payment = self.db.fetch_payment(payment_id).await?.ok_or(ShopDatabaseError::PaymentNotFound(payment_id))?;
        Ok(payment)
    }
}
