//! Error types

mod config;
mod fetch;

pub use config::*;
pub use fetch::*;
