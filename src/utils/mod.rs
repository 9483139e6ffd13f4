//! Utility functions for ryt-decipher

pub mod cache;
pub mod url;

pub use cache::*;
pub use self::url::*;
