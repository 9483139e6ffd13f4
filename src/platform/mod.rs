//! Player assets and the signature cipher engine

pub mod cipher;
pub mod client;
pub mod player;
pub mod source;

pub use client::*;
pub use player::*;
pub use source::*;
