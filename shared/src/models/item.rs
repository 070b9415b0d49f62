//! Item and category models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock item: an ingredient, packaging unit, or finished gelato product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    /// Unit label shown on dashboards and exports (e.g., "kg", "tub", "L")
    pub unit: String,
    /// Target stock level at the hub, used for status classification
    pub target_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Item category (e.g., dairy, fruit, packaging)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCategory {
    pub id: Uuid,
    pub name: String,
}
