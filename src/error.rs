use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Login submission failed: {0}")]
    LoginError(String),
    #[error("A purchase is already in progress")]
    PurchaseInFlight,
}

pub type Result<T> = std::result::Result<T, PortalError>;
