//! Gateway Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures in the payload encryption layer.
///
/// Always fatal for the request in flight; never retried automatically.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key is not one of the two accepted lengths.
    #[error("encryption key must be 16 or 32 bytes, got {0}")]
    KeyLength(usize),

    /// Ciphertext is not valid base64.
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Block decryption or padding removal failed.
    #[error("payload decryption failed")]
    Decrypt,

    /// Decrypted bytes are not a UTF-8 document.
    #[error("decrypted payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Payment gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Payload encryption or decryption failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Processor returned a non-200 status or a malformed envelope
    #[error("remote error: {0}")]
    Remote(String),

    /// Transport-level failure reaching the processor
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The processor handled the call and reported a failure
    #[error("processor declined: {0}")]
    Business(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Host collaborator failure (order lookup, metadata, storage)
    #[error("host error: {0}")]
    Host(String),
}

impl GatewayError {
    /// Shopper-facing failure description.
    ///
    /// Business failures carry the processor's own wording verbatim.
    /// Everything else collapses to the supplied generic text so that
    /// transport and crypto details never reach the shopper.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            GatewayError::Business(description) => description.clone(),
            _ => generic.to_string(),
        }
    }

    /// Check if resubmitting the request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Remote(_) | GatewayError::Network(_))
    }
}
