//! The part of a stream format the resolver works with

use serde::{Deserialize, Serialize};

/// Stream format as listed in a player response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    /// Format ID (itag)
    pub itag: u32,
    /// Direct URL, present when no deciphering is needed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// URL-encoded `s`/`sp`/`url` cipher string
    #[serde(
        default,
        alias = "cipher",
        skip_serializing_if = "Option::is_none"
    )]
    pub signature_cipher: Option<String>,
}

impl StreamFormat {
    /// Format with a directly usable URL
    pub fn direct(itag: u32, url: impl Into<String>) -> Self {
        Self {
            itag,
            url: Some(url.into()),
            signature_cipher: None,
        }
    }

    /// Format that must be deciphered
    pub fn ciphered(itag: u32, signature_cipher: impl Into<String>) -> Self {
        Self {
            itag,
            url: None,
            signature_cipher: Some(signature_cipher.into()),
        }
    }

    /// Direct URL if it is usable as is
    pub fn direct_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Check if format needs signature deciphering
    pub fn needs_deciphering(&self) -> bool {
        self.direct_url().is_none()
            && self
                .signature_cipher
                .as_deref()
                .is_some_and(|cipher| !cipher.is_empty())
    }
}
