//! Production batch models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded production run at the factory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub id: Uuid,
    pub produced_at: DateTime<Utc>,
    /// Finished product item, when the batch produces a tracked item
    pub output_item_id: Option<Uuid>,
    pub output_quantity: Option<Decimal>,
    pub note: Option<String>,
    pub ingredients: Vec<ProductionIngredient>,
}

/// Ingredient consumption recorded against a production batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionIngredient {
    pub item_id: Uuid,
    pub quantity_used: Decimal,
}
