use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PayOsConfig,
    data_objects::{CheckoutData, PaymentLinkData, PaymentLinkRequest, PayOsResponse, WebhookPayload, SUCCESS_CODE},
    helpers::webhook_signature,
    PayOsApiError,
    WebhookData,
};

#[derive(Clone)]
pub struct PayOsApi {
    config: PayOsConfig,
    client: Arc<Client>,
}

impl PayOsApi {
    pub fn new(config: PayOsConfig) -> Result<Self, PayOsApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let client_id = HeaderValue::from_str(config.client_id.as_str())
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        let api_key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        headers.insert("x-client-id", client_id);
        headers.insert("x-api-key", api_key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PayOsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a request to PayOS and returns the decoded envelope together with the raw response text. Callers keep
    /// the raw text for audit storage.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<(PayOsResponse<T>, String), PayOsApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                PayOsApiError::Timeout
            } else {
                PayOsApiError::RestResponseError(e.to_string())
            }
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| PayOsApiError::RestResponseError(e.to_string()))?;
        if !status.is_success() {
            return Err(PayOsApiError::QueryError { status: status.as_u16(), message: text });
        }
        trace!("REST query successful. {status}");
        let envelope = serde_json::from_str(&text).map_err(|e| PayOsApiError::JsonError(e.to_string()))?;
        Ok((envelope, text))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Ask PayOS for a hosted checkout page. Returns the checkout data and the raw response text.
    pub async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<(CheckoutData, String), PayOsApiError> {
        let order_code = request.order_code;
        debug!("Creating payment link for order code {order_code}");
        let body = request.into_signed(self.config.checksum_key.reveal());
        let (envelope, raw) =
            self.rest_query::<CheckoutData, _>(Method::POST, "/v2/payment-requests", Some(body)).await?;
        let data = unwrap_envelope(envelope)?;
        info!("Created payment link for order code {order_code}: {}", data.payment_link_id);
        Ok((data, raw))
    }

    /// Fetch the current state of a payment link. `id` may be the numeric order code or the payment link id.
    pub async fn get_payment_link_information(&self, id: &str) -> Result<(PaymentLinkData, String), PayOsApiError> {
        let path = format!("/v2/payment-requests/{id}");
        debug!("Fetching payment link information for {id}");
        let (envelope, raw) = self.rest_query::<PaymentLinkData, ()>(Method::GET, &path, None).await?;
        let data = unwrap_envelope(envelope)?;
        trace!("Payment link {id} is {}", data.status);
        Ok((data, raw))
    }

    pub async fn cancel_payment_link(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<(PaymentLinkData, String), PayOsApiError> {
        let path = format!("/v2/payment-requests/{id}/cancel");
        debug!("Cancelling payment link {id}");
        let body = serde_json::json!({ "cancellationReason": reason });
        let (envelope, raw) = self.rest_query::<PaymentLinkData, _>(Method::POST, &path, Some(body)).await?;
        let data = unwrap_envelope(envelope)?;
        info!("Cancelled payment link {id}");
        Ok((data, raw))
    }

    /// Authenticate a webhook delivery: the `signature` field must be the HMAC over the `data` object under the
    /// merchant's checksum key. Only then is `data` interpreted.
    pub fn verify_webhook_payload(&self, raw_payload: &str) -> Result<(WebhookPayload, WebhookData), PayOsApiError> {
        let payload: WebhookPayload =
            serde_json::from_str(raw_payload).map_err(|e| PayOsApiError::JsonError(e.to_string()))?;
        let expected = webhook_signature(self.config.checksum_key.reveal(), &payload.data);
        if payload.signature != expected {
            return Err(PayOsApiError::InvalidSignature);
        }
        let data: WebhookData =
            serde_json::from_value(payload.data.clone()).map_err(|e| PayOsApiError::JsonError(e.to_string()))?;
        Ok((payload, data))
    }
}

fn unwrap_envelope<T>(envelope: PayOsResponse<T>) -> Result<T, PayOsApiError> {
    if envelope.code != SUCCESS_CODE {
        return Err(PayOsApiError::Rejected { code: envelope.code, desc: envelope.desc });
    }
    envelope.data.ok_or(PayOsApiError::EmptyResponse(envelope.desc))
}
