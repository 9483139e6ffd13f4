//! Stream resolution for ryt-decipher

pub mod format;
pub mod resolver;

pub use format::*;
pub use resolver::*;
