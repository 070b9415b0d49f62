//! Database models for the Gelato Operations Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
