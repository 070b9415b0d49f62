//! Derived-inventory pipeline: baseline selection, movement aggregation,
//! and status classification
//!
//! All functions here are pure over already-fetched records. The backend
//! fetches the rows, runs this pipeline in memory, and serializes the
//! result; nothing is cached or mutated across requests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DeliveryPlan, Item, ProductionBatch, PurchaseOrder, Stocktake};
use crate::types::DateRange;

/// Caller-selected strategy for choosing the baseline snapshot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMode {
    #[default]
    Auto,
    Master,
    Latest,
}

/// Which baseline actually anchored a derivation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    Master,
    Latest,
    None,
}

/// Selected per-item baseline quantities plus metadata
#[derive(Debug, Clone)]
pub struct Baseline {
    pub quantities: HashMap<Uuid, Decimal>,
    pub source: BaselineSource,
    pub taken_at: Option<DateTime<Utc>>,
}

impl Baseline {
    pub fn empty() -> Self {
        Self {
            quantities: HashMap::new(),
            source: BaselineSource::None,
            taken_at: None,
        }
    }

    /// Baseline for one item; items absent from every snapshot get 0
    pub fn quantity(&self, item_id: Uuid) -> Decimal {
        self.quantities
            .get(&item_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Most recent master stocktake at the hub, if any
pub fn master_baseline(stocktakes: &[Stocktake], hub_id: Uuid) -> Option<Baseline> {
    let master = stocktakes
        .iter()
        .filter(|s| s.location_id == hub_id && s.is_master)
        .max_by_key(|s| s.taken_at)?;

    let quantities = master
        .lines
        .iter()
        .map(|l| (l.item_id, l.quantity))
        .collect();

    Some(Baseline {
        quantities,
        source: BaselineSource::Master,
        taken_at: Some(master.taken_at),
    })
}

/// Merge snapshots newest-first; the first value seen per item wins
///
/// Sorting by timestamp descending before the fold makes the tie-break
/// deterministic regardless of the order rows arrived in.
pub fn latest_quantities(stocktakes: &[Stocktake]) -> HashMap<Uuid, Decimal> {
    let mut ordered: Vec<&Stocktake> = stocktakes.iter().collect();
    ordered.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));

    let mut quantities = HashMap::new();
    for snapshot in ordered {
        for line in &snapshot.lines {
            quantities.entry(line.item_id).or_insert(line.quantity);
        }
    }
    quantities
}

/// Latest-count baseline across all locations, ignoring master flags
pub fn latest_baseline(stocktakes: &[Stocktake]) -> Baseline {
    let taken_at = stocktakes.iter().map(|s| s.taken_at).max();
    Baseline {
        quantities: latest_quantities(stocktakes),
        source: if taken_at.is_some() {
            BaselineSource::Latest
        } else {
            BaselineSource::None
        },
        taken_at,
    }
}

/// Pick the baseline for a derivation run
///
/// `auto` prefers the master and falls back to latest; the caller is
/// responsible for the side-effecting master auto-creation when the
/// returned source is not `Master` in auto mode.
pub fn select_baseline(mode: BaselineMode, stocktakes: &[Stocktake], hub_id: Uuid) -> Baseline {
    match mode {
        BaselineMode::Master => {
            master_baseline(stocktakes, hub_id).unwrap_or_else(Baseline::empty)
        }
        BaselineMode::Latest => latest_baseline(stocktakes),
        BaselineMode::Auto => master_baseline(stocktakes, hub_id)
            .unwrap_or_else(|| latest_baseline(stocktakes)),
    }
}

/// Per-item signed movement totals over a date range
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MovementTotals {
    pub incoming: Decimal,
    pub outgoing: Decimal,
    pub production: Decimal,
}

impl MovementTotals {
    /// Net movement: incoming - outgoing + production
    ///
    /// Production is added, not subtracted: the source system records
    /// consumption as a negative stocktake adjustment elsewhere, and the
    /// dashboard figure intentionally mirrors that convention.
    pub fn net(&self) -> Decimal {
        self.incoming - self.outgoing + self.production
    }
}

/// Sum incoming, outgoing, and production quantities per item
pub fn aggregate_movements(
    orders: &[PurchaseOrder],
    deliveries: &[DeliveryPlan],
    productions: &[ProductionBatch],
    range: DateRange,
) -> HashMap<Uuid, MovementTotals> {
    let mut totals: HashMap<Uuid, MovementTotals> = HashMap::new();

    for order in orders {
        if !order.status.counts_as_incoming() || !range.contains(order.expected_date) {
            continue;
        }
        for line in &order.lines {
            totals.entry(line.item_id).or_default().incoming += line.quantity;
        }
    }

    for plan in deliveries {
        if !plan.status.counts_as_outgoing() || !range.contains(plan.delivery_date) {
            continue;
        }
        for line in &plan.lines {
            totals.entry(line.item_id).or_default().outgoing += line.quantity;
        }
    }

    for batch in productions {
        if !range.contains(batch.produced_at.date_naive()) {
            continue;
        }
        for ingredient in &batch.ingredients {
            totals.entry(ingredient.item_id).or_default().production +=
                ingredient.quantity_used;
        }
    }

    totals
}

/// True when the baseline snapshot postdates the range start, i.e. early
/// movements in the window are already reflected in the baseline
pub fn is_partial_window(baseline_taken_at: Option<DateTime<Utc>>, range: DateRange) -> bool {
    baseline_taken_at
        .map(|t| t.date_naive() > range.start)
        .unwrap_or(false)
}

/// Stock level classification relative to an item's target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Critical,
    Low,
    Normal,
    High,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
            StockStatus::High => "high",
        }
    }
}

/// Classify a derived quantity against a target stock level
///
/// 0 is always critical; below a quarter of target is critical; below half
/// is low; above double is high. Thresholds are strict comparisons, so a
/// quantity exactly at a quarter of target classifies as low.
pub fn classify_stock(derived: Decimal, target: Decimal) -> StockStatus {
    let quarter = target * Decimal::new(25, 2);
    let half = target * Decimal::new(5, 1);
    let double = target * Decimal::TWO;

    if derived == Decimal::ZERO || derived < quarter {
        StockStatus::Critical
    } else if derived < half {
        StockStatus::Low
    } else if derived > double {
        StockStatus::High
    } else {
        StockStatus::Normal
    }
}

/// One computed dashboard row; exists only for the duration of a request
#[derive(Debug, Clone, Serialize)]
pub struct DerivedInventoryRow {
    pub item_id: Uuid,
    pub item_name: String,
    pub unit: String,
    pub target_stock: Decimal,
    pub baseline_quantity: Decimal,
    pub incoming: Decimal,
    pub outgoing: Decimal,
    pub production: Decimal,
    pub net_movement: Decimal,
    pub derived_current: Decimal,
    pub status: StockStatus,
}

/// Combine baseline and movements into one row per item
pub fn derive_rows(
    items: &[Item],
    baseline: &Baseline,
    movements: &HashMap<Uuid, MovementTotals>,
) -> Vec<DerivedInventoryRow> {
    items
        .iter()
        .map(|item| {
            let base = baseline.quantity(item.id);
            let totals = movements.get(&item.id).copied().unwrap_or_default();
            let net = totals.net();
            let derived = base + net;
            DerivedInventoryRow {
                item_id: item.id,
                item_name: item.name.clone(),
                unit: item.unit.clone(),
                target_stock: item.target_stock,
                baseline_quantity: base,
                incoming: totals.incoming,
                outgoing: totals.outgoing,
                production: totals.production,
                net_movement: net,
                derived_current: derived,
                status: classify_stock(derived, item.target_stock),
            }
        })
        .collect()
}

/// One calendar day of movement for a single item
#[derive(Debug, Clone, Serialize)]
pub struct ItemDayMovement {
    pub date: chrono::NaiveDate,
    pub incoming: Decimal,
    pub outgoing: Decimal,
    pub production: Decimal,
    pub net_movement: Decimal,
}

/// Per-day movement history for one item across a range
///
/// Emits one row for every calendar day in the range, zero-filled on days
/// without movement. Summed over the range the rows equal the aggregate
/// movement for the same item and range.
pub fn item_history(
    item_id: Uuid,
    orders: &[PurchaseOrder],
    deliveries: &[DeliveryPlan],
    productions: &[ProductionBatch],
    range: DateRange,
) -> Vec<ItemDayMovement> {
    range
        .days()
        .map(|date| {
            let day = DateRange::day(date);
            let totals = aggregate_movements(orders, deliveries, productions, day)
                .get(&item_id)
                .copied()
                .unwrap_or_default();
            ItemDayMovement {
                date,
                incoming: totals.incoming,
                outgoing: totals.outgoing,
                production: totals.production,
                net_movement: totals.net(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StocktakeLine, Stocktake};
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn snapshot(location: Uuid, ts: i64, is_master: bool, lines: &[(Uuid, &str)]) -> Stocktake {
        Stocktake {
            id: Uuid::new_v4(),
            location_id: location,
            taken_at: Utc.timestamp_opt(ts, 0).unwrap(),
            is_master,
            note: None,
            lines: lines
                .iter()
                .map(|(item, qty)| StocktakeLine {
                    item_id: *item,
                    quantity: dec(qty),
                })
                .collect(),
        }
    }

    #[test]
    fn latest_baseline_first_value_wins() {
        let hub = Uuid::new_v4();
        let item = Uuid::new_v4();
        let snapshots = vec![
            snapshot(hub, 100, false, &[(item, "5")]),
            snapshot(hub, 200, false, &[(item, "9")]),
        ];

        let baseline = latest_baseline(&snapshots);
        assert_eq!(baseline.quantity(item), dec("9"));
        assert_eq!(baseline.source, BaselineSource::Latest);
    }

    #[test]
    fn latest_baseline_no_snapshots_is_zero() {
        let baseline = latest_baseline(&[]);
        assert_eq!(baseline.quantity(Uuid::new_v4()), Decimal::ZERO);
        assert_eq!(baseline.source, BaselineSource::None);
        assert!(baseline.taken_at.is_none());
        // No observations means no quantities to seed a master from
        assert!(latest_quantities(&[]).is_empty());
    }

    #[test]
    fn master_mode_ignores_newer_non_master() {
        let hub = Uuid::new_v4();
        let item = Uuid::new_v4();
        let snapshots = vec![
            snapshot(hub, 100, true, &[(item, "50")]),
            snapshot(hub, 900, false, &[(item, "1")]),
        ];

        let baseline = select_baseline(BaselineMode::Master, &snapshots, hub);
        assert_eq!(baseline.source, BaselineSource::Master);
        assert_eq!(baseline.quantity(item), dec("50"));
    }

    #[test]
    fn master_mode_other_location_master_does_not_count() {
        let hub = Uuid::new_v4();
        let store = Uuid::new_v4();
        let item = Uuid::new_v4();
        let snapshots = vec![snapshot(store, 100, true, &[(item, "7")])];

        let baseline = select_baseline(BaselineMode::Master, &snapshots, hub);
        assert_eq!(baseline.source, BaselineSource::None);
        assert_eq!(baseline.quantity(item), Decimal::ZERO);
    }

    #[test]
    fn classify_boundaries() {
        let target = dec("20");
        assert_eq!(classify_stock(Decimal::ZERO, target), StockStatus::Critical);
        assert_eq!(classify_stock(dec("4.99"), target), StockStatus::Critical);
        // Exactly a quarter of target is low, not critical
        assert_eq!(classify_stock(dec("5"), target), StockStatus::Low);
        assert_eq!(classify_stock(dec("9.99"), target), StockStatus::Low);
        assert_eq!(classify_stock(dec("10"), target), StockStatus::Normal);
        assert_eq!(classify_stock(dec("40"), target), StockStatus::Normal);
        assert_eq!(classify_stock(dec("40.01"), target), StockStatus::High);
    }

    #[test]
    fn partial_window_when_baseline_postdates_start() {
        let range = DateRange::new(
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        let mid = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();

        assert!(is_partial_window(Some(mid), range));
        assert!(!is_partial_window(Some(before), range));
        assert!(!is_partial_window(None, range));
    }
}
