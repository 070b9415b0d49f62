//! Derived-inventory pipeline tests
//!
//! Covers baseline selection, movement aggregation, the derivation
//! identity, status classification boundaries, and per-day item history.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::derivation::{
    aggregate_movements, classify_stock, derive_rows, item_history, latest_baseline,
    select_baseline, Baseline, BaselineMode, BaselineSource, MovementTotals, StockStatus,
};
use shared::models::{
    DeliveryLine, DeliveryPlan, DeliveryStatus, Item, OrderLine, OrderStatus, ProductionBatch,
    ProductionIngredient, PurchaseOrder, Stocktake, StocktakeLine,
};
use shared::types::DateRange;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn item(id: Uuid, target: &str) -> Item {
    Item {
        id,
        name: "Pistachio base".to_string(),
        category_id: None,
        unit: "kg".to_string(),
        target_stock: dec(target),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn snapshot(location: Uuid, ts: i64, is_master: bool, lines: &[(Uuid, Decimal)]) -> Stocktake {
    Stocktake {
        id: Uuid::new_v4(),
        location_id: location,
        taken_at: Utc.timestamp_opt(ts, 0).unwrap(),
        is_master,
        note: None,
        lines: lines
            .iter()
            .map(|(item_id, quantity)| StocktakeLine {
                item_id: *item_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

fn order(status: OrderStatus, expected: NaiveDate, lines: &[(Uuid, Decimal)]) -> PurchaseOrder {
    PurchaseOrder {
        id: Uuid::new_v4(),
        supplier_name: "Dairy supplier".to_string(),
        status,
        expected_date: expected,
        created_at: Utc::now(),
        lines: lines
            .iter()
            .map(|(item_id, quantity)| OrderLine {
                id: Uuid::new_v4(),
                item_id: *item_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

fn delivery(status: DeliveryStatus, day: NaiveDate, lines: &[(Uuid, Decimal)]) -> DeliveryPlan {
    DeliveryPlan {
        id: Uuid::new_v4(),
        status,
        delivery_date: day,
        destination_location_id: Some(Uuid::new_v4()),
        customer_ids: Vec::new(),
        note: None,
        created_at: Utc::now(),
        lines: lines
            .iter()
            .map(|(item_id, quantity)| DeliveryLine {
                item_id: *item_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

fn batch(day: NaiveDate, ingredients: &[(Uuid, Decimal)]) -> ProductionBatch {
    ProductionBatch {
        id: Uuid::new_v4(),
        produced_at: Utc
            .with_ymd_and_hms(
                chrono::Datelike::year(&day),
                chrono::Datelike::month(&day),
                chrono::Datelike::day(&day),
                10,
                0,
                0,
            )
            .unwrap(),
        output_item_id: None,
        output_quantity: None,
        note: None,
        ingredients: ingredients
            .iter()
            .map(|(item_id, quantity_used)| ProductionIngredient {
                item_id: *item_id,
                quantity_used: *quantity_used,
            })
            .collect(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_movement_aggregation_by_status() {
        let item_id = Uuid::new_v4();
        let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 30));

        let orders = vec![
            order(OrderStatus::Pending, date(2025, 6, 5), &[(item_id, dec("10"))]),
            order(OrderStatus::Confirmed, date(2025, 6, 6), &[(item_id, dec("4"))]),
            // Received and cancelled orders no longer count as incoming
            order(OrderStatus::Received, date(2025, 6, 7), &[(item_id, dec("99"))]),
            order(OrderStatus::Cancelled, date(2025, 6, 8), &[(item_id, dec("99"))]),
        ];
        let deliveries = vec![
            delivery(DeliveryStatus::Confirmed, date(2025, 6, 10), &[(item_id, dec("3"))]),
            // Drafts do not count as outgoing
            delivery(DeliveryStatus::Draft, date(2025, 6, 11), &[(item_id, dec("50"))]),
        ];
        let productions = vec![batch(date(2025, 6, 12), &[(item_id, dec("2"))])];

        let totals = aggregate_movements(&orders, &deliveries, &productions, range);
        let t = totals[&item_id];
        assert_eq!(t.incoming, dec("14"));
        assert_eq!(t.outgoing, dec("3"));
        assert_eq!(t.production, dec("2"));
        // Production is added, not subtracted
        assert_eq!(t.net(), dec("13"));
    }

    #[test]
    fn test_movement_outside_range_ignored() {
        let item_id = Uuid::new_v4();
        let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 30));

        let orders = vec![order(
            OrderStatus::Pending,
            date(2025, 7, 1),
            &[(item_id, dec("10"))],
        )];
        let totals = aggregate_movements(&orders, &[], &[], range);
        assert!(totals.is_empty());
    }

    #[test]
    fn test_latest_mode_no_snapshots_zero_baseline() {
        let item_id = Uuid::new_v4();
        let baseline = select_baseline(BaselineMode::Latest, &[], Uuid::new_v4());
        assert_eq!(baseline.source, BaselineSource::None);
        assert_eq!(baseline.quantity(item_id), Decimal::ZERO);

        let rows = derive_rows(&[item(item_id, "20")], &baseline, &HashMap::new());
        assert_eq!(rows[0].baseline_quantity, Decimal::ZERO);
        assert_eq!(rows[0].derived_current, Decimal::ZERO);
        assert_eq!(rows[0].status, StockStatus::Critical);
    }

    #[test]
    fn test_master_mode_ignores_newer_non_master() {
        let hub = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let snapshots = vec![
            snapshot(hub, 1_000, true, &[(item_id, dec("50"))]),
            snapshot(hub, 9_000, false, &[(item_id, dec("2"))]),
        ];

        let baseline = select_baseline(BaselineMode::Master, &snapshots, hub);
        assert_eq!(baseline.source, BaselineSource::Master);
        assert_eq!(baseline.quantity(item_id), dec("50"));
    }

    #[test]
    fn test_auto_mode_falls_back_to_latest() {
        let hub = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let snapshots = vec![snapshot(hub, 1_000, false, &[(item_id, dec("8"))])];

        let baseline = select_baseline(BaselineMode::Auto, &snapshots, hub);
        assert_eq!(baseline.source, BaselineSource::Latest);
        assert_eq!(baseline.quantity(item_id), dec("8"));
    }

    #[test]
    fn test_latest_newest_value_wins() {
        let hub = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        // Rows deliberately out of timestamp order
        let snapshots = vec![
            snapshot(hub, 5_000, false, &[(item_id, dec("3"))]),
            snapshot(hub, 9_000, false, &[(item_id, dec("7"))]),
            snapshot(hub, 1_000, false, &[(item_id, dec("1"))]),
        ];

        let baseline = latest_baseline(&snapshots);
        assert_eq!(baseline.quantity(item_id), dec("7"));
    }

    #[test]
    fn test_classification_boundaries() {
        let target = dec("100");
        assert_eq!(classify_stock(dec("0"), target), StockStatus::Critical);
        assert_eq!(classify_stock(dec("24.999"), target), StockStatus::Critical);
        // Exactly a quarter of target classifies as low
        assert_eq!(classify_stock(dec("25"), target), StockStatus::Low);
        assert_eq!(classify_stock(dec("49.999"), target), StockStatus::Low);
        assert_eq!(classify_stock(dec("50"), target), StockStatus::Normal);
        assert_eq!(classify_stock(dec("200"), target), StockStatus::Normal);
        assert_eq!(classify_stock(dec("200.001"), target), StockStatus::High);
    }

    #[test]
    fn test_item_history_one_row_per_day() {
        let item_id = Uuid::new_v4();
        let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 7));
        let orders = vec![order(
            OrderStatus::Pending,
            date(2025, 6, 3),
            &[(item_id, dec("5"))],
        )];

        let history = item_history(item_id, &orders, &[], &[], range);
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].date, date(2025, 6, 1));
        assert_eq!(history[6].date, date(2025, 6, 7));
        assert_eq!(history[2].incoming, dec("5"));
        // Days without movement are zero-filled
        assert_eq!(history[0].net_movement, Decimal::ZERO);
        assert_eq!(history[4].net_movement, Decimal::ZERO);
    }

    #[test]
    fn test_item_history_sums_equal_aggregate() {
        let item_id = Uuid::new_v4();
        let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 10));
        let orders = vec![
            order(OrderStatus::Pending, date(2025, 6, 2), &[(item_id, dec("5"))]),
            order(OrderStatus::Confirmed, date(2025, 6, 9), &[(item_id, dec("3"))]),
        ];
        let deliveries = vec![delivery(
            DeliveryStatus::Confirmed,
            date(2025, 6, 4),
            &[(item_id, dec("2"))],
        )];
        let productions = vec![batch(date(2025, 6, 6), &[(item_id, dec("1.5"))])];

        let history = item_history(item_id, &orders, &deliveries, &productions, range);
        let summed_net: Decimal = history.iter().map(|d| d.net_movement).sum();

        let aggregate = aggregate_movements(&orders, &deliveries, &productions, range);
        assert_eq!(summed_net, aggregate[&item_id].net());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for non-negative quantities with 3 decimal places
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    /// Strategy for strictly positive target levels
    fn target_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// derived_current == baseline + incoming - outgoing + production
        #[test]
        fn prop_derivation_identity(
            base in quantity_strategy(),
            incoming in quantity_strategy(),
            outgoing in quantity_strategy(),
            production in quantity_strategy(),
            target in target_strategy()
        ) {
            let item_id = Uuid::new_v4();
            let baseline = Baseline {
                quantities: [(item_id, base)].into_iter().collect(),
                source: BaselineSource::Master,
                taken_at: Some(Utc::now()),
            };
            let movements: HashMap<Uuid, MovementTotals> = [(
                item_id,
                MovementTotals { incoming, outgoing, production },
            )]
            .into_iter()
            .collect();

            let rows = derive_rows(&[item(item_id, &target.to_string())], &baseline, &movements);
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(
                rows[0].derived_current,
                base + incoming - outgoing + production
            );
            prop_assert_eq!(rows[0].net_movement, incoming - outgoing + production);
        }

        /// Classification is consistent with the threshold definition
        #[test]
        fn prop_classification_thresholds(
            derived in quantity_strategy(),
            target in target_strategy()
        ) {
            let status = classify_stock(derived, target);
            let quarter = target * Decimal::new(25, 2);
            let half = target * Decimal::new(5, 1);
            let double = target * Decimal::TWO;

            let expected = if derived == Decimal::ZERO || derived < quarter {
                StockStatus::Critical
            } else if derived < half {
                StockStatus::Low
            } else if derived > double {
                StockStatus::High
            } else {
                StockStatus::Normal
            };
            prop_assert_eq!(status, expected);
        }

        /// History rows cover every day exactly once and sum to the aggregate
        #[test]
        fn prop_history_totals_match_aggregate(
            quantities in prop::collection::vec(quantity_strategy(), 1..8),
            day_offsets in prop::collection::vec(0u64..28, 1..8)
        ) {
            let item_id = Uuid::new_v4();
            let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 28));

            let orders: Vec<PurchaseOrder> = quantities
                .iter()
                .zip(day_offsets.iter())
                .map(|(q, offset)| {
                    let day = date(2025, 6, 1) + chrono::Days::new(*offset);
                    order(OrderStatus::Pending, day, &[(item_id, *q)])
                })
                .collect();

            let history = item_history(item_id, &orders, &[], &[], range);
            prop_assert_eq!(history.len(), 28);

            let summed: Decimal = history.iter().map(|d| d.incoming).sum();
            let aggregate = aggregate_movements(&orders, &[], &[], range);
            let expected = aggregate
                .get(&item_id)
                .map(|t| t.incoming)
                .unwrap_or(Decimal::ZERO);
            prop_assert_eq!(summed, expected);
        }
    }
}
