//! Error types for webhook operations

use thiserror::Error;

/// Errors that can occur during webhook notification and delivery
#[derive(Error, Debug)]
pub enum WebhookError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error (missing serializer, unknown signing algorithm,
    /// unregistered filter format, mixed filter formats). Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid notification construction
    #[error("Invalid notification: {0}")]
    Notification(String),

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    Payload(String),

    /// Event transformation failed
    #[error("Transform error: {0}")]
    Transform(String),

    /// Filter evaluation failed
    #[error("Filter error: {0}")]
    Filter(String),

    /// Subscription resolution failed; fatal to the whole notify call
    #[error("Subscription resolution failed: {0}")]
    Resolution(String),

    /// Subscription not found
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// A delivery attempt exceeded its timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Delivery was cancelled before completing
    #[error("Delivery cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Payload(err.to_string())
    }
}
