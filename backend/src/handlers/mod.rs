//! HTTP handlers for the Gelato Operations Platform

pub mod auth;
pub mod customers;
pub mod deliveries;
pub mod health;
pub mod inventory;
pub mod items;
pub mod locations;
pub mod orders;
pub mod productions;
pub mod stocktakes;

pub use auth::*;
pub use customers::*;
pub use deliveries::*;
pub use health::*;
pub use inventory::*;
pub use items::*;
pub use locations::*;
pub use orders::*;
pub use productions::*;
pub use stocktakes::*;
