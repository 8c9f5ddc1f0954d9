use thiserror::Error;

/// Result type alias for Wavefront operations
pub type Result<T> = std::result::Result<T, WavefrontError>;

/// Errors that can occur when interacting with the Wavefront API
#[derive(Debug, Error)]
pub enum WavefrontError {
    /// Client configuration is missing or invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to build HTTP client
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest_middleware::Error),

    /// Failed to read the response body
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Wavefront API returned an error response
    #[error("Wavefront API error: HTTP {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from Wavefront
        message: String,
    },

    /// A successful response carried no payload
    #[error("Wavefront returned no {kind} in the response")]
    EmptyResponse {
        /// Entity kind, e.g. `alert`
        kind: &'static str,
    },

    /// The entity has not been created yet, so it has no identifier
    #[error("{kind} id field is not set")]
    MissingId {
        /// Entity kind, e.g. `alert`
        kind: &'static str,
    },

    /// The entity was rejected before being sent
    #[error("Invalid {kind}: {message}")]
    Validation {
        /// Entity kind, e.g. `alert`
        kind: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl WavefrontError {
    pub(crate) fn validation(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    /// Check if the error is retryable
    ///
    /// Returns `true` for:
    /// - Network/connection errors
    /// - Timeout errors
    /// - Server errors (5xx status codes)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(reqwest_middleware::Error::Reqwest(err)) => {
                err.is_connect() || err.is_timeout()
            }
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the remote entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
