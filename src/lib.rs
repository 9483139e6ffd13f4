//! # ryt-decipher - signature decipher engine
//!
//! Turns the `signatureCipher` attached to protected stream formats into a
//! playable URL.
//!
//! ## Features
//!
//! - Player release discovery from the embed page
//! - Operation plan extraction from player code (splice, swap, reverse)
//! - Signature timestamp extraction
//! - Single-slot plan cache with TTL
//! - Timeouts and cancellation on every resolver call
//!
//! ## Example
//!
//! ```rust,no_run
//! use ryt_decipher::StreamResolver;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = StreamResolver::new()?;
//!     let cancel = CancellationToken::new();
//!
//!     let stream = resolver
//!         .decipher_url("VIDEO_ID", "s=...&sp=sig&url=...", &cancel)
//!         .await?;
//!     println!("{}", stream.url);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use core::{ResolvedStream, ResolverConfig, StreamFormat, StreamResolver};
pub use error::DecipherError;
pub use platform::cipher::{Operation, OperationKind, OperationPlan};
pub use platform::PlayerRelease;
pub use utils::DecipherCache;

/// Result type alias for ryt-decipher operations
pub type Result<T> = std::result::Result<T, DecipherError>;
