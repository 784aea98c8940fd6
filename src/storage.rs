//! Storage implementations for sessions

mod interface;
pub use interface::*;

pub mod memory;

#[cfg(feature = "filesystem")]
pub mod filesystem;
