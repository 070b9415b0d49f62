//! Deficit-driven allocation of received stock to locations below target
//!
//! Runs after a purchase order is marked received. Pure logic only; the
//! backend applies the resulting allocations to delivery plans.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use std::collections::HashMap;

/// One received quantity awaiting distribution
#[derive(Debug, Clone)]
pub struct ReceivedItem {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// A non-hub location's targets and last observed quantities
///
/// Slice order is the allocation order: callers sort by the location
/// `priority` column before calling [`allocate_deficits`].
#[derive(Debug, Clone)]
pub struct LocationStock {
    pub location_id: Uuid,
    pub targets: HashMap<Uuid, Decimal>,
    pub current: HashMap<Uuid, Decimal>,
}

impl LocationStock {
    /// Unmet deficit for one item, clamped at zero
    pub fn deficit(&self, item_id: Uuid) -> Decimal {
        let target = self.targets.get(&item_id).copied().unwrap_or(Decimal::ZERO);
        let current = self.current.get(&item_id).copied().unwrap_or(Decimal::ZERO);
        (target - current).max(Decimal::ZERO)
    }
}

/// A quantity of one item assigned to one location
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Allocation {
    pub location_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Greedily distribute received quantities to locations below target
///
/// Per item, a shared remaining pool starts at the received quantity and
/// each location in order takes `min(deficit, remaining)`. There is no
/// back-filling or rebalancing once a location has been visited; the
/// location order is a hard tie-break, not a fairness guarantee.
pub fn allocate_deficits(
    received: &[ReceivedItem],
    locations: &[LocationStock],
) -> Vec<Allocation> {
    let mut allocations = Vec::new();

    for item in received {
        let mut remaining = item.quantity;
        for location in locations {
            if remaining <= Decimal::ZERO {
                break;
            }
            let allocated = location.deficit(item.item_id).min(remaining);
            if allocated > Decimal::ZERO {
                allocations.push(Allocation {
                    location_id: location.location_id,
                    item_id: item.item_id,
                    quantity: allocated,
                });
                remaining -= allocated;
            }
        }
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn location(id: Uuid, item: Uuid, target: &str, current: &str) -> LocationStock {
        LocationStock {
            location_id: id,
            targets: [(item, dec(target))].into_iter().collect(),
            current: [(item, dec(current))].into_iter().collect(),
        }
    }

    #[test]
    fn allocates_in_order_until_pool_empty() {
        let item = Uuid::new_v4();
        let (l1, l2, l3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let locations = vec![
            location(l1, item, "10", "4"),  // deficit 6
            location(l2, item, "10", "5"),  // deficit 5
            location(l3, item, "10", "0"),  // deficit 10, pool exhausted
        ];
        let received = vec![ReceivedItem {
            item_id: item,
            quantity: dec("8"),
        }];

        let allocations = allocate_deficits(&received, &locations);
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].location_id, l1);
        assert_eq!(allocations[0].quantity, dec("6"));
        assert_eq!(allocations[1].location_id, l2);
        assert_eq!(allocations[1].quantity, dec("2"));
    }

    #[test]
    fn surplus_location_gets_nothing() {
        let item = Uuid::new_v4();
        let full = location(Uuid::new_v4(), item, "10", "15");
        let received = vec![ReceivedItem {
            item_id: item,
            quantity: dec("5"),
        }];

        assert!(allocate_deficits(&received, &[full]).is_empty());
    }

    #[test]
    fn unknown_item_has_zero_deficit() {
        let stock = location(Uuid::new_v4(), Uuid::new_v4(), "10", "0");
        let received = vec![ReceivedItem {
            item_id: Uuid::new_v4(),
            quantity: dec("5"),
        }];

        assert!(allocate_deficits(&received, &[stock]).is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn quantity_strategy() -> impl Strategy<Value = Decimal> {
            (0i64..=100_000i64).prop_map(|n| Decimal::new(n, 3))
        }

        proptest! {
            /// The pool bounds the total handed out, and every allocation
            /// stays within that location's deficit
            #[test]
            fn total_allocated_never_exceeds_pool(
                pool in (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 3)),
                profiles in prop::collection::vec(
                    (quantity_strategy(), quantity_strategy()),
                    1..10
                )
            ) {
                let item = Uuid::new_v4();
                let locations: Vec<LocationStock> = profiles
                    .iter()
                    .map(|(target, current)| LocationStock {
                        location_id: Uuid::new_v4(),
                        targets: [(item, *target)].into_iter().collect(),
                        current: [(item, *current)].into_iter().collect(),
                    })
                    .collect();
                let received = vec![ReceivedItem { item_id: item, quantity: pool }];

                let allocations = allocate_deficits(&received, &locations);
                let total: Decimal = allocations.iter().map(|a| a.quantity).sum();
                prop_assert!(total <= pool);

                let by_location: std::collections::HashMap<Uuid, &LocationStock> =
                    locations.iter().map(|l| (l.location_id, l)).collect();
                for a in &allocations {
                    prop_assert!(a.quantity > Decimal::ZERO);
                    prop_assert!(a.quantity <= by_location[&a.location_id].deficit(item));
                }
            }
        }
    }
}
