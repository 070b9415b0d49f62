//! Location models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of physical locations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Factory,
    Store,
}

/// A physical location holding inventory
///
/// Exactly one location is expected to be the hub (the factory whose
/// stocktakes anchor the derived-inventory baseline). `priority` is the
/// explicit iteration order used by the deficit allocator, ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub kind: LocationKind,
    pub is_hub: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

/// Per-item target quantity at a location, consumed by the allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationItemTarget {
    pub location_id: Uuid,
    pub item_id: Uuid,
    pub target_quantity: Decimal,
}
