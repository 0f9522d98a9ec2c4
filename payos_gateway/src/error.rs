use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayOsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request to PayOS timed out")]
    Timeout,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("PayOS rejected the request. code={code}. {desc}")]
    Rejected { code: String, desc: String },
    #[error("The response carried no data payload. {0}")]
    EmptyResponse(String),
    #[error("The webhook signature does not match the payload")]
    InvalidSignature,
}
