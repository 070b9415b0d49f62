//! Domain models for the Gelato Operations Platform

pub mod delivery;
pub mod item;
pub mod location;
pub mod order;
pub mod production;
pub mod stocktake;

pub use delivery::*;
pub use item::*;
pub use location::*;
pub use order::*;
pub use production::*;
pub use stocktake::*;
