//! Glue between the engine's [`PaymentGateway`] seam and the PayOS client crate.
//!
//! The engine reasons about gateways in its own vocabulary (checkout links, status snapshots, payment updates);
//! this module translates that vocabulary onto PayOS wire calls and maps PayOS failures onto [`GatewayError`].
use checkout_engine::{
    db_types::PaymentProvider,
    traits::{
        CancelOutcome,
        CheckoutLink,
        CheckoutRequest,
        GatewayError,
        GatewayPaymentState,
        PaymentGateway,
        PaymentUpdate,
        StatusSnapshot,
    },
};
use log::*;
use payos_gateway::{PaymentItem, PaymentLinkRequest, PayOsApi, PayOsApiError, PayOsConfig, SUCCESS_CODE};

#[derive(Clone)]
pub struct PayOsGateway {
    api: PayOsApi,
}

impl PayOsGateway {
    pub fn new(config: PayOsConfig) -> Result<Self, PayOsApiError> {
        let api = PayOsApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for PayOsGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::PayOs
    }

    async fn create_checkout_link(&self, request: CheckoutRequest) -> Result<CheckoutLink, GatewayError> {
        let items = request
            .items
            .iter()
            .map(|i| PaymentItem { name: i.name.clone(), quantity: i.quantity, price: i.unit_price.value() })
            .collect();
        let link_request = PaymentLinkRequest {
            order_code: request.order_code,
            amount: request.amount.value(),
            description: request.description,
            items,
            return_url: request.success_url,
            cancel_url: request.cancel_url,
        };
        let (data, raw) = self.api.create_payment_link(link_request).await.map_err(to_gateway_error)?;
        // The numeric order code doubles as the transaction id on our side; it is the key PayOS reports back with
        Ok(CheckoutLink {
            transaction_id: data.order_code.to_string(),
            checkout_url: data.checkout_url,
            raw_response: raw,
        })
    }

    async fn query_status(&self, transaction_id: &str) -> Result<StatusSnapshot, GatewayError> {
        let (data, raw) = self.api.get_payment_link_information(transaction_id).await.map_err(to_gateway_error)?;
        let status: GatewayPaymentState = data.status.parse()?;
        Ok(StatusSnapshot { status, raw_response: raw })
    }

    async fn cancel(&self, transaction_id: &str, reason: &str) -> Result<CancelOutcome, GatewayError> {
        let (_, raw) = self.api.cancel_payment_link(transaction_id, reason).await.map_err(to_gateway_error)?;
        Ok(CancelOutcome { raw_response: raw })
    }

    fn verify_webhook(&self, raw_payload: &str) -> Result<PaymentUpdate, GatewayError> {
        let (payload, data) = self.api.verify_webhook_payload(raw_payload).map_err(to_gateway_error)?;
        // PayOS only pushes webhooks for finished transactions: a signed-off success code means the money moved,
        // anything else is a failed or abandoned attempt
        let paid = payload.code == SUCCESS_CODE && data.code == SUCCESS_CODE && payload.success.unwrap_or(true);
        let status = if paid { GatewayPaymentState::Paid } else { GatewayPaymentState::Cancelled };
        trace!("💸️ Webhook for order code {} verified: {status}", data.order_code);
        Ok(PaymentUpdate {
            transaction_id: data.order_code.to_string(),
            order_code: data.order_code,
            status,
            raw: raw_payload.to_string(),
        })
    }
}

fn to_gateway_error(e: PayOsApiError) -> GatewayError {
    match e {
        PayOsApiError::Timeout => GatewayError::Timeout,
        PayOsApiError::Rejected { code, desc } => GatewayError::Rejected { code, desc },
        PayOsApiError::InvalidSignature => GatewayError::InvalidSignature,
        PayOsApiError::JsonError(s) => GatewayError::InvalidPayload(s),
        other => GatewayError::RequestFailed(other.to_string()),
    }
}
