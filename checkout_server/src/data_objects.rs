use serde::{Deserialize, Serialize};

/// The standard acknowledgement body for fire-and-forget endpoints (webhooks in particular).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemParams {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuantityParams {
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedParams {
    pub selected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderParams {
    pub customer_id: i64,
    pub ship_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelPaymentParams {
    #[serde(default)]
    pub reason: Option<String>,
}
