//! Error types for ryt-decipher

use std::sync::Arc;
use thiserror::Error;

/// Main error type for signature deciphering operations
#[derive(Debug, Error)]
pub enum DecipherError {
    #[error("Player asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("Signature extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Malformed cipher query: {0}")]
    MalformedCipherQuery(String),

    #[error("Cipher application anomaly: {0}")]
    ApplicationAnomaly(String),

    #[error("Cipher application failed: {0}")]
    ApplicationFailed(String),

    #[error("Format has neither a direct URL nor a signature cipher")]
    CipherNotFound,

    #[error("Invalid video ID: {0}")]
    InvalidVideoId(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl DecipherError {
    /// Check if the caller may reasonably retry the failed operation.
    ///
    /// Nothing inside this crate retries; the flag is for callers that own
    /// a retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DecipherError::AssetUnavailable(_) | DecipherError::Timeout(_) | DecipherError::Http(_)
        )
    }

    /// Take back an error that was shared between coalesced callers.
    ///
    /// The sole owner gets the original; other waiters get an equivalent
    /// copy, with transport errors flattened into `AssetUnavailable`.
    pub fn from_shared(error: Arc<DecipherError>) -> Self {
        Arc::try_unwrap(error).unwrap_or_else(|shared| match shared.as_ref() {
            DecipherError::AssetUnavailable(m) => DecipherError::AssetUnavailable(m.clone()),
            DecipherError::ExtractionFailed(m) => DecipherError::ExtractionFailed(m.clone()),
            DecipherError::MalformedCipherQuery(m) => {
                DecipherError::MalformedCipherQuery(m.clone())
            }
            DecipherError::ApplicationAnomaly(m) => DecipherError::ApplicationAnomaly(m.clone()),
            DecipherError::ApplicationFailed(m) => DecipherError::ApplicationFailed(m.clone()),
            DecipherError::CipherNotFound => DecipherError::CipherNotFound,
            DecipherError::InvalidVideoId(m) => DecipherError::InvalidVideoId(m.clone()),
            DecipherError::Timeout(m) => DecipherError::Timeout(m.clone()),
            DecipherError::Cancelled => DecipherError::Cancelled,
            other => DecipherError::AssetUnavailable(other.to_string()),
        })
    }

    /// Check if the error comes from the player code itself rather than transport
    pub fn is_player_error(&self) -> bool {
        matches!(
            self,
            DecipherError::ExtractionFailed(_)
                | DecipherError::ApplicationAnomaly(_)
                | DecipherError::ApplicationFailed(_)
        )
    }
}
