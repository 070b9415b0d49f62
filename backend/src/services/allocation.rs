//! Deficit-driven delivery scheduling after an order is received
//!
//! Best-effort: the caller has already committed the order receipt, so a
//! failure here is logged and swallowed, never surfaced to the user.

use chrono::{Days, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stocktake::load_recent_for_locations;
use shared::allocation::{allocate_deficits, Allocation, LocationStock, ReceivedItem};
use shared::derivation::latest_quantities;
use shared::models::Stocktake;

/// Allocation service
#[derive(Clone)]
pub struct AllocationService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct TargetRow {
    location_id: Uuid,
    item_id: Uuid,
    target_quantity: Decimal,
}

impl AllocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Distribute newly received quantities to non-hub locations below
    /// their targets, upserting lines onto tomorrow's delivery plans
    ///
    /// Locations are visited in ascending `priority` order; the order is a
    /// hard tie-break. Returns the applied allocations.
    pub async fn schedule_deficit_deliveries(
        &self,
        received: &[ReceivedItem],
    ) -> AppResult<Vec<Allocation>> {
        if received.is_empty() {
            return Ok(Vec::new());
        }

        let location_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM locations WHERE is_hub = false ORDER BY priority, created_at",
        )
        .fetch_all(&self.db)
        .await?;

        if location_ids.is_empty() {
            return Ok(Vec::new());
        }

        let targets = sqlx::query_as::<_, TargetRow>(
            r#"
            SELECT location_id, item_id, target_quantity
            FROM location_item_targets
            WHERE location_id = ANY($1)
            "#,
        )
        .bind(&location_ids)
        .fetch_all(&self.db)
        .await?;

        let stocktakes = load_recent_for_locations(&self.db, &location_ids).await?;
        let locations = build_location_stock(&location_ids, &targets, &stocktakes);

        let allocations = allocate_deficits(received, &locations);
        if allocations.is_empty() {
            return Ok(allocations);
        }

        self.apply_allocations(&allocations).await?;
        Ok(allocations)
    }

    /// Upsert allocations onto each location's delivery plan for tomorrow
    async fn apply_allocations(&self, allocations: &[Allocation]) -> AppResult<()> {
        let tomorrow = Utc::now().date_naive() + Days::new(1);

        let mut by_location: HashMap<Uuid, Vec<&Allocation>> = HashMap::new();
        for allocation in allocations {
            by_location
                .entry(allocation.location_id)
                .or_default()
                .push(allocation);
        }

        for (location_id, entries) in by_location {
            let plan_id = self.find_or_create_plan(location_id, tomorrow).await?;
            let line_count = entries.len();

            for allocation in entries {
                // Additive merge: an existing line accumulates, it is never
                // replaced. The increment is atomic at the storage layer.
                sqlx::query(
                    r#"
                    INSERT INTO delivery_plan_lines (plan_id, item_id, quantity)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (plan_id, item_id)
                    DO UPDATE SET quantity = delivery_plan_lines.quantity + EXCLUDED.quantity
                    "#,
                )
                .bind(plan_id)
                .bind(allocation.item_id)
                .bind(allocation.quantity)
                .execute(&self.db)
                .await?;
            }

            tracing::info!(
                "Scheduled {} deficit line(s) onto plan {} for location {}",
                line_count,
                plan_id,
                location_id
            );
        }

        Ok(())
    }

    async fn find_or_create_plan(
        &self,
        location_id: Uuid,
        date: chrono::NaiveDate,
    ) -> AppResult<Uuid> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM delivery_plans
            WHERE destination_location_id = $1
              AND delivery_date = $2
              AND status IN ('draft', 'confirmed')
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(location_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO delivery_plans (status, delivery_date, destination_location_id, note)
            VALUES ('draft', $1, $2, 'Auto-scheduled from received stock')
            RETURNING id
            "#,
        )
        .bind(date)
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }
}

/// Assemble the allocator's per-location view, preserving location order
fn build_location_stock(
    location_ids: &[Uuid],
    targets: &[TargetRow],
    stocktakes: &[Stocktake],
) -> Vec<LocationStock> {
    location_ids
        .iter()
        .map(|&location_id| {
            let location_targets = targets
                .iter()
                .filter(|t| t.location_id == location_id)
                .map(|t| (t.item_id, t.target_quantity))
                .collect();

            let location_snapshots: Vec<Stocktake> = stocktakes
                .iter()
                .filter(|s| s.location_id == location_id)
                .cloned()
                .collect();

            LocationStock {
                location_id,
                targets: location_targets,
                current: latest_quantities(&location_snapshots),
            }
        })
        .collect()
}
