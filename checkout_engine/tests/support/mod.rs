//! Shared fixtures for the engine integration tests: a scripted in-memory payment gateway and database setup
//! helpers.
#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use checkout_engine::{
    db_types::PaymentProvider,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{
        CancelOutcome,
        CheckoutLink,
        CheckoutRequest,
        GatewayError,
        GatewayPaymentState,
        PaymentGateway,
        PaymentUpdate,
        RedirectUrls,
        StatusSnapshot,
    },
    OrderFlowApi,
    SqliteDatabase,
};

pub async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn order_api(db: &SqliteDatabase, gateway: &MockGateway) -> OrderFlowApi<SqliteDatabase, MockGateway> {
    let redirects = RedirectUrls::new("https://shop.test/payment/success", "https://shop.test/payment/cancel");
    OrderFlowApi::new(db.clone(), gateway.clone(), redirects)
}

#[derive(Default)]
struct MockState {
    fail_create: bool,
    fail_cancel: bool,
    // None means the poll errors out with a timeout
    poll_result: Option<GatewayPaymentState>,
    cancelled: Vec<String>,
}

/// A scripted stand-in for the external gateway. Webhook payloads use a toy JSON shape; the engine treats payloads
/// as opaque, so only the mock itself ever interprets them.
#[derive(Clone)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        let state = MockState { poll_result: Some(GatewayPaymentState::Pending), ..MockState::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.state.lock().unwrap().fail_cancel = fail;
    }

    pub fn set_poll_result(&self, result: Option<GatewayPaymentState>) {
        self.state.lock().unwrap().poll_result = result;
    }

    pub fn cancelled_txids(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn webhook_payload(txid: &str, status: &str, signature: &str) -> String {
        format!(r#"{{"signature":"{signature}","data":{{"txid":"{txid}","status":"{status}"}}}}"#)
    }
}

impl PaymentGateway for MockGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::PayOs
    }

    async fn create_checkout_link(&self, request: CheckoutRequest) -> Result<CheckoutLink, GatewayError> {
        if self.state.lock().unwrap().fail_create {
            return Err(GatewayError::RequestFailed("scripted failure".to_string()));
        }
        assert!(request.description.chars().count() <= 25);
        Ok(CheckoutLink {
            transaction_id: request.order_code.to_string(),
            checkout_url: format!("https://pay.test/web/{}", request.order_code),
            raw_response: format!(r#"{{"orderCode":{}}}"#, request.order_code),
        })
    }

    async fn query_status(&self, _transaction_id: &str) -> Result<StatusSnapshot, GatewayError> {
        let result = self.state.lock().unwrap().poll_result;
        match result {
            Some(status) => Ok(StatusSnapshot { status, raw_response: format!(r#"{{"status":"{status}"}}"#) }),
            None => Err(GatewayError::Timeout),
        }
    }

    async fn cancel(&self, transaction_id: &str, _reason: &str) -> Result<CancelOutcome, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_cancel {
            return Err(GatewayError::RequestFailed("scripted cancel failure".to_string()));
        }
        state.cancelled.push(transaction_id.to_string());
        Ok(CancelOutcome { raw_response: r#"{"desc":"cancelled"}"#.to_string() })
    }

    fn verify_webhook(&self, raw_payload: &str) -> Result<PaymentUpdate, GatewayError> {
        let value: serde_json::Value =
            serde_json::from_str(raw_payload).map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
        if value["signature"].as_str() != Some("valid") {
            return Err(GatewayError::InvalidSignature);
        }
        let txid = value["data"]["txid"]
            .as_str()
            .ok_or_else(|| GatewayError::InvalidPayload("missing txid".to_string()))?;
        let status: GatewayPaymentState = value["data"]["status"]
            .as_str()
            .ok_or_else(|| GatewayError::InvalidPayload("missing status".to_string()))?
            .parse()?;
        Ok(PaymentUpdate {
            transaction_id: txid.to_string(),
            order_code: txid.parse().unwrap_or_default(),
            status,
            raw: raw_payload.to_string(),
        })
    }
}
