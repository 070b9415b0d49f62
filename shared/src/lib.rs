//! Shared types and logic for the Gelato Operations Platform
//!
//! This crate contains the domain models and the pure inventory
//! derivation/allocation logic used by the backend. Keeping the
//! derivation pure makes it testable without a database.

pub mod allocation;
pub mod derivation;
pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
