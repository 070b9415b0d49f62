//! Stocktake (inventory snapshot) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A counted inventory snapshot at one location
///
/// A stocktake flagged `is_master` at the hub is a full physical count
/// that resets the derived-inventory baseline; other stocktakes are
/// incremental counts (daily receipts, spot checks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stocktake {
    pub id: Uuid,
    pub location_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub is_master: bool,
    pub note: Option<String>,
    pub lines: Vec<StocktakeLine>,
}

/// One counted item within a stocktake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
}
