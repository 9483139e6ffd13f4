//! Replaying an operation plan against a scrambled signature

use super::{OperationKind, OperationPlan};
use crate::error::DecipherError;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Fields of a format's `signatureCipher` query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherQuery {
    /// Base stream URL (`url`)
    pub url: String,
    /// Scrambled signature (`s`)
    pub signature: String,
    /// Name of the query parameter that carries the signature (`sp`)
    pub signature_param: String,
}

impl CipherQuery {
    /// Parse a URL-encoded cipher string like `s=...&sp=sig&url=...`.
    ///
    /// Every field must be present and non-empty; a field repeated with a
    /// different value is rejected.
    pub fn parse(cipher: &str) -> Result<Self, DecipherError> {
        let mut url: Option<String> = None;
        let mut signature: Option<String> = None;
        let mut signature_param: Option<String> = None;

        for (key, value) in url::form_urlencoded::parse(cipher.as_bytes()) {
            let slot = match key.as_ref() {
                "url" => &mut url,
                "s" => &mut signature,
                "sp" => &mut signature_param,
                _ => continue,
            };
            match slot.as_deref() {
                Some(existing) if existing != value.as_ref() => {
                    return Err(DecipherError::MalformedCipherQuery(format!(
                        "conflicting values for field `{}`",
                        key
                    )));
                }
                Some(_) => {}
                None => *slot = Some(value.into_owned()),
            }
        }

        Ok(Self {
            url: required("url", url)?,
            signature: required("s", signature)?,
            signature_param: required("sp", signature_param)?,
        })
    }
}

impl FromStr for CipherQuery {
    type Err = DecipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, DecipherError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(DecipherError::MalformedCipherQuery(format!(
            "field `{}` is empty",
            field
        ))),
        None => Err(DecipherError::MalformedCipherQuery(format!(
            "missing field `{}`",
            field
        ))),
    }
}

/// Non-fatal irregularity noticed while applying a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAnomaly {
    /// No operations were extracted, so the signature passed through unchanged
    EmptyPlan,
}

impl fmt::Display for CipherAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherAnomaly::EmptyPlan => {
                write!(f, "empty operation plan left the signature unchanged")
            }
        }
    }
}

/// Outcome of [`apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCipher {
    pub url: String,
    pub signature: String,
    pub anomaly: Option<CipherAnomaly>,
}

/// Run `plan` over `signature` and return the descrambled signature.
///
/// Swapping on an empty buffer is an error rather than a no-op.
pub fn apply_plan(plan: &OperationPlan, signature: &str) -> Result<String, DecipherError> {
    let mut chars: Vec<char> = signature.chars().collect();

    for operation in plan {
        match operation.kind {
            OperationKind::Splice => {
                let count = operation.argument.min(chars.len());
                chars.drain(..count);
            }
            OperationKind::Swap => {
                if chars.is_empty() {
                    return Err(DecipherError::ApplicationFailed(format!(
                        "{} on an empty signature",
                        operation
                    )));
                }
                let index = operation.argument % chars.len();
                chars.swap(0, index);
            }
            OperationKind::Reverse => chars.reverse(),
        }
    }

    Ok(chars.into_iter().collect())
}

/// `<url>&<param>=<signature>`
pub fn build_url(base_url: &str, signature_param: &str, signature: &str) -> String {
    format!("{}&{}={}", base_url, signature_param, signature)
}

/// Decipher the query's signature and assemble the playable URL
pub fn apply(plan: &OperationPlan, query: &CipherQuery) -> Result<AppliedCipher, DecipherError> {
    let signature = apply_plan(plan, &query.signature)?;

    let anomaly = if plan.is_empty() {
        warn!(
            "Applying an empty operation plan; signature for {} was not transformed",
            query.signature_param
        );
        Some(CipherAnomaly::EmptyPlan)
    } else {
        None
    };

    debug!("Applied {} operations to signature", plan.len());
    Ok(AppliedCipher {
        url: build_url(&query.url, &query.signature_param, &signature),
        signature,
        anomaly,
    })
}
