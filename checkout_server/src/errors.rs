use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{traits::ShopDatabaseError, CheckoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment provider could not complete the request. Please try again later.")]
    PaymentProviderUnavailable,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentProviderUnavailable => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::DatabaseError(db) => match db {
                ShopDatabaseError::ProductNotFound(_) |
                ShopDatabaseError::CartNotFound(_) |
                ShopDatabaseError::OrderNotFound(_) |
                ShopDatabaseError::PaymentNotFound(_) |
                ShopDatabaseError::PaymentTxidNotFound(_) => Self::NoRecordFound(db.to_string()),
                ShopDatabaseError::EmptyCart |
                ShopDatabaseError::ItemNotInCart { .. } |
                ShopDatabaseError::InsufficientStock { .. } |
                ShopDatabaseError::InvalidStateChange { .. } => Self::InvalidRequest(db.to_string()),
                ShopDatabaseError::DuplicatePendingPayment(_) => Self::Conflict(db.to_string()),
                ShopDatabaseError::DatabaseError(e) => Self::BackendError(e),
            },
            // Whatever the provider said is logged upstream; clients only ever see the generic message
            CheckoutError::GatewayError(_) => Self::PaymentProviderUnavailable,
            CheckoutError::OrderAlreadyPaid(_) => Self::Conflict(e.to_string()),
            CheckoutError::OrderNotPayable { .. } |
            CheckoutError::NonPositiveTotal(_) |
            CheckoutError::PaymentNotCancellable { .. } => Self::InvalidRequest(e.to_string()),
        }
    }
}
