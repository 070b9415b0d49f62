//! Business logic services for the Gelato Operations Platform

pub mod allocation;
pub mod auth;
pub mod customer;
pub mod delivery;
pub mod inventory;
pub mod item;
pub mod location;
pub mod order;
pub mod production;
pub mod stocktake;

pub use allocation::AllocationService;
pub use auth::AuthService;
pub use customer::CustomerService;
pub use delivery::DeliveryService;
pub use inventory::InventoryService;
pub use item::ItemService;
pub use location::LocationService;
pub use order::OrderService;
pub use production::ProductionService;
pub use stocktake::StocktakeService;
