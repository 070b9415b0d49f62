//! Deficit allocator tests
//!
//! Covers the greedy per-item distribution: each location in order takes
//! min(deficit, remaining), no back-filling, pool exhaustion starves later
//! locations.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::allocation::{allocate_deficits, LocationStock, ReceivedItem};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn location(id: Uuid, item: Uuid, target: Decimal, current: Decimal) -> LocationStock {
    LocationStock {
        location_id: id,
        targets: [(item, target)].into_iter().collect(),
        current: [(item, current)].into_iter().collect(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_exact_fill_in_priority_order() {
        let item = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let locations = vec![
            location(first, item, dec("10"), dec("7")), // deficit 3
            location(second, item, dec("10"), dec("6")), // deficit 4
        ];
        let received = vec![ReceivedItem {
            item_id: item,
            quantity: dec("7"),
        }];

        let allocations = allocate_deficits(&received, &locations);
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].location_id, first);
        assert_eq!(allocations[0].quantity, dec("3"));
        assert_eq!(allocations[1].location_id, second);
        assert_eq!(allocations[1].quantity, dec("4"));
    }

    #[test]
    fn test_pool_exhaustion_starves_later_locations() {
        let item = Uuid::new_v4();
        let (first, second, third) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let locations = vec![
            location(first, item, dec("10"), dec("0")), // deficit 10
            location(second, item, dec("10"), dec("5")), // deficit 5
            location(third, item, dec("10"), dec("0")), // deficit 10
        ];
        let received = vec![ReceivedItem {
            item_id: item,
            quantity: dec("12"),
        }];

        let allocations = allocate_deficits(&received, &locations);
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].quantity, dec("10"));
        assert_eq!(allocations[1].quantity, dec("2"));
        // Third location gets nothing once the pool is empty
        assert!(allocations.iter().all(|a| a.location_id != third));
    }

    #[test]
    fn test_no_back_filling_after_surplus() {
        let item = Uuid::new_v4();
        let (surplus, needy) = (Uuid::new_v4(), Uuid::new_v4());
        let locations = vec![
            location(surplus, item, dec("10"), dec("20")), // above target
            location(needy, item, dec("10"), dec("1")),    // deficit 9
        ];
        let received = vec![ReceivedItem {
            item_id: item,
            quantity: dec("5"),
        }];

        let allocations = allocate_deficits(&received, &locations);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].location_id, needy);
        assert_eq!(allocations[0].quantity, dec("5"));
    }

    #[test]
    fn test_items_share_nothing() {
        let (item_a, item_b) = (Uuid::new_v4(), Uuid::new_v4());
        let loc = Uuid::new_v4();
        let stock = LocationStock {
            location_id: loc,
            targets: [(item_a, dec("10")), (item_b, dec("10"))].into_iter().collect(),
            current: HashMap::new(),
        };
        let received = vec![
            ReceivedItem { item_id: item_a, quantity: dec("4") },
            ReceivedItem { item_id: item_b, quantity: dec("6") },
        ];

        let allocations = allocate_deficits(&received, &[stock]);
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].quantity, dec("4"));
        assert_eq!(allocations[1].quantity, dec("6"));
    }

    #[test]
    fn test_no_locations_no_allocations() {
        let received = vec![ReceivedItem {
            item_id: Uuid::new_v4(),
            quantity: dec("5"),
        }];
        assert!(allocate_deficits(&received, &[]).is_empty());
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
        (0i64..=100_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    /// Strategy for a positive received pool
    fn pool_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Each allocation is min(deficit, remaining-before) and the total
        /// never exceeds the received pool
        #[test]
        fn prop_greedy_min_deficit_remaining(
            pool in pool_strategy(),
            profiles in prop::collection::vec((quantity_strategy(), quantity_strategy()), 1..10)
        ) {
            let item = Uuid::new_v4();
            let locations: Vec<LocationStock> = profiles
                .iter()
                .map(|(target, current)| {
                    location(Uuid::new_v4(), item, *target, *current)
                })
                .collect();
            let received = vec![ReceivedItem { item_id: item, quantity: pool }];

            let allocations = allocate_deficits(&received, &locations);

            let total: Decimal = allocations.iter().map(|a| a.quantity).sum();
            prop_assert!(total <= pool);

            // Replay the greedy walk and check each step
            let mut remaining = pool;
            let mut next = allocations.iter();
            for loc in &locations {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let expected = loc.deficit(item).min(remaining);
                if expected > Decimal::ZERO {
                    let a = next.next().expect("missing allocation");
                    prop_assert_eq!(a.location_id, loc.location_id);
                    prop_assert_eq!(a.quantity, expected);
                    remaining -= expected;
                }
            }
            prop_assert!(next.next().is_none());
        }

        /// No allocation ever exceeds the location's deficit
        #[test]
        fn prop_never_over_deficit(
            pool in pool_strategy(),
            profiles in prop::collection::vec((quantity_strategy(), quantity_strategy()), 1..10)
        ) {
            let item = Uuid::new_v4();
            let locations: Vec<LocationStock> = profiles
                .iter()
                .map(|(target, current)| {
                    location(Uuid::new_v4(), item, *target, *current)
                })
                .collect();
            let received = vec![ReceivedItem { item_id: item, quantity: pool }];

            let by_location: HashMap<Uuid, &LocationStock> =
                locations.iter().map(|l| (l.location_id, l)).collect();

            for a in allocate_deficits(&received, &locations) {
                let loc = by_location[&a.location_id];
                prop_assert!(a.quantity <= loc.deficit(item));
                prop_assert!(a.quantity > Decimal::ZERO);
            }
        }
    }
}
