//! Delivery plan models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery plan lifecycle states
///
/// Only `Confirmed` plans count toward outgoing movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Draft,
    Confirmed,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Draft => "draft",
            DeliveryStatus::Confirmed => "confirmed",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn counts_as_outgoing(&self) -> bool {
        matches!(self, DeliveryStatus::Confirmed)
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DeliveryStatus::Draft),
            "confirmed" => Ok(DeliveryStatus::Confirmed),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(format!("Unknown delivery status: {}", other)),
        }
    }
}

/// An outbound delivery plan from the hub
///
/// The destination is either one retail location or one-or-more wholesale
/// customers; neither is required while the plan is a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPlan {
    pub id: Uuid,
    pub status: DeliveryStatus,
    pub delivery_date: NaiveDate,
    pub destination_location_id: Option<Uuid>,
    pub customer_ids: Vec<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<DeliveryLine>,
}

/// One planned item within a delivery plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// A wholesale customer (gelateria, restaurant, reseller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholesaleCustomer {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
}
