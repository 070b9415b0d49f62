//! Derived-inventory service: dashboard, CSV export, and item history
//!
//! Fetches the rows a derivation run needs (items, snapshots, orders,
//! deliveries, productions), then runs the pure pipeline from the shared
//! crate in memory. Nothing here is cached across requests.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stocktake::load_recent_stocktakes;
use shared::derivation::{
    self, BaselineMode, BaselineSource, DerivedInventoryRow, ItemDayMovement, MovementTotals,
    StockStatus,
};
use shared::models::{
    DeliveryLine, DeliveryPlan, DeliveryStatus, Item, OrderLine, OrderStatus, ProductionBatch,
    ProductionIngredient, PurchaseOrder,
};
use shared::types::DateRange;

/// Derived-inventory service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Dashboard response payload
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub inventory: Vec<DerivedInventoryRow>,
    pub summary: InventorySummary,
    pub baseline: BaselineSource,
    pub baseline_date: Option<DateTime<Utc>>,
    pub movement_summary: MovementSummary,
    pub partial_window: bool,
}

/// Item counts per status bucket
#[derive(Debug, Default, Serialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub critical: usize,
    pub low: usize,
    pub normal: usize,
    pub high: usize,
}

/// Movement totals summed across all items
#[derive(Debug, Default, Serialize)]
pub struct MovementSummary {
    pub incoming: Decimal,
    pub outgoing: Decimal,
    pub production: Decimal,
    pub net_movement: Decimal,
}

/// Result of the explicit ensure-master-baseline operation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnsureBaselineOutcome {
    Created,
    AlreadyExists,
}

/// One CSV export row; field order defines the column order
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    item: &'a str,
    baseline: Decimal,
    incoming: Decimal,
    outgoing: Decimal,
    production: Decimal,
    net_movement: Decimal,
    derived_current: Decimal,
    unit: &'a str,
    target: Decimal,
    status: &'static str,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    category_id: Option<Uuid>,
    unit: String,
    target_stock: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderHeadRow {
    id: Uuid,
    supplier_name: String,
    status: String,
    expected_date: NaiveDate,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: Uuid,
    order_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct DeliveryHeadRow {
    id: Uuid,
    status: String,
    delivery_date: NaiveDate,
    destination_location_id: Option<Uuid>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DeliveryLineRow {
    plan_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct ProductionHeadRow {
    id: Uuid,
    produced_at: DateTime<Utc>,
    output_item_id: Option<Uuid>,
    output_quantity: Option<Decimal>,
    note: Option<String>,
}

#[derive(Debug, FromRow)]
struct ProductionIngredientRow {
    batch_id: Uuid,
    item_id: Uuid,
    quantity_used: Decimal,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute the derived-inventory dashboard for a date range
    pub async fn dashboard(
        &self,
        range: DateRange,
        mode: BaselineMode,
    ) -> AppResult<DashboardResponse> {
        let items = self.load_items().await?;
        let stocktakes = load_recent_stocktakes(&self.db).await?;
        let hub_id = self.hub_location_id().await?;

        // Independent reads combined after all resolve
        let (orders, deliveries, productions) = tokio::try_join!(
            self.load_orders_in_range(range),
            self.load_deliveries_in_range(range),
            self.load_productions_in_range(range),
        )?;

        let baseline = derivation::select_baseline(
            mode,
            &stocktakes,
            hub_id.unwrap_or_else(Uuid::nil),
        );

        // Auto mode repairs a missing master snapshot best-effort; the
        // read must still succeed from the in-memory latest values.
        if mode == BaselineMode::Auto && baseline.source != BaselineSource::Master {
            if let Err(e) = self.ensure_master_baseline().await {
                tracing::warn!("Master baseline auto-creation failed: {}", e);
            }
        }

        let movements = derivation::aggregate_movements(&orders, &deliveries, &productions, range);
        let rows = derivation::derive_rows(&items, &baseline, &movements);
        let partial_window = derivation::is_partial_window(baseline.taken_at, range);

        Ok(DashboardResponse {
            summary: summarize(&rows),
            movement_summary: summarize_movements(&movements),
            baseline: baseline.source,
            baseline_date: baseline.taken_at,
            partial_window,
            inventory: rows,
        })
    }

    /// Export the dashboard as CSV; totals are identical to the JSON
    /// dashboard because both come from the same row computation
    pub async fn export_csv(&self, range: DateRange, mode: BaselineMode) -> AppResult<String> {
        let dashboard = self.dashboard(range, mode).await?;

        let mut wtr = csv::Writer::from_writer(vec![]);
        for row in &dashboard.inventory {
            wtr.serialize(ExportRow {
                item: &row.item_name,
                baseline: row.baseline_quantity,
                incoming: row.incoming,
                outgoing: row.outgoing,
                production: row.production,
                net_movement: row.net_movement,
                derived_current: row.derived_current,
                unit: &row.unit,
                target: row.target_stock,
                status: row.status.as_str(),
            })
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;

        Ok(csv_data)
    }

    /// Per-day movement rows for one item across a range
    pub async fn item_history(
        &self,
        item_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<ItemDayMovement>> {
        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let (orders, deliveries, productions) = tokio::try_join!(
            self.load_orders_in_range(range),
            self.load_deliveries_in_range(range),
            self.load_productions_in_range(range),
        )?;

        Ok(derivation::item_history(
            item_id,
            &orders,
            &deliveries,
            &productions,
            range,
        ))
    }

    /// Idempotently create a master snapshot at the hub from the latest
    /// observed values
    ///
    /// Explicit repair operation: callers choose whether to trigger it,
    /// and the dashboard's auto mode swallows its failure.
    pub async fn ensure_master_baseline(&self) -> AppResult<EnsureBaselineOutcome> {
        let hub_id = self
            .hub_location_id()
            .await?
            .ok_or_else(|| AppError::NotFound("Hub location".to_string()))?;

        let stocktakes = load_recent_stocktakes(&self.db).await?;
        if derivation::master_baseline(&stocktakes, hub_id).is_some() {
            return Ok(EnsureBaselineOutcome::AlreadyExists);
        }

        let quantities = derivation::latest_quantities(&stocktakes);
        if quantities.is_empty() {
            // Nothing observed yet; an empty master would anchor future
            // master-mode reads to a zero count.
            return Err(AppError::Validation {
                field: "stocktakes".to_string(),
                message: "No recent stocktakes to derive a master baseline from".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let snapshot_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stocktakes (location_id, is_master, note)
            VALUES ($1, true, 'Auto-created master baseline')
            RETURNING id
            "#,
        )
        .bind(hub_id)
        .fetch_one(&mut *tx)
        .await?;

        for (item_id, quantity) in &quantities {
            sqlx::query(
                "INSERT INTO stocktake_lines (stocktake_id, item_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(snapshot_id)
            .bind(item_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Created master baseline snapshot {} with {} lines",
            snapshot_id,
            quantities.len()
        );
        Ok(EnsureBaselineOutcome::Created)
    }

    /// The designated hub location, if one is configured
    pub(crate) async fn hub_location_id(&self) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM locations WHERE is_hub = true ORDER BY priority, created_at LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }

    async fn load_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, category_id, unit, target_stock, is_active, created_at
            FROM items
            WHERE is_active = true
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Item {
                id: r.id,
                name: r.name,
                category_id: r.category_id,
                unit: r.unit,
                target_stock: r.target_stock,
                is_active: r.is_active,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn load_orders_in_range(&self, range: DateRange) -> AppResult<Vec<PurchaseOrder>> {
        let heads = sqlx::query_as::<_, OrderHeadRow>(
            r#"
            SELECT id, supplier_name, status, expected_date, created_at
            FROM purchase_orders
            WHERE status IN ('pending', 'confirmed')
              AND expected_date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();
        let lines = sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, item_id, quantity FROM purchase_order_lines WHERE order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            lines_by_order.entry(line.order_id).or_default().push(OrderLine {
                id: line.id,
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }

        heads
            .into_iter()
            .map(|h| {
                Ok(PurchaseOrder {
                    lines: lines_by_order.remove(&h.id).unwrap_or_default(),
                    status: OrderStatus::from_str(&h.status)
                        .map_err(AppError::Internal)?,
                    id: h.id,
                    supplier_name: h.supplier_name,
                    expected_date: h.expected_date,
                    created_at: h.created_at,
                })
            })
            .collect()
    }

    async fn load_deliveries_in_range(&self, range: DateRange) -> AppResult<Vec<DeliveryPlan>> {
        let heads = sqlx::query_as::<_, DeliveryHeadRow>(
            r#"
            SELECT id, status, delivery_date, destination_location_id, note, created_at
            FROM delivery_plans
            WHERE status = 'confirmed'
              AND delivery_date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();
        let lines = sqlx::query_as::<_, DeliveryLineRow>(
            "SELECT plan_id, item_id, quantity FROM delivery_plan_lines WHERE plan_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_plan: HashMap<Uuid, Vec<DeliveryLine>> = HashMap::new();
        for line in lines {
            lines_by_plan.entry(line.plan_id).or_default().push(DeliveryLine {
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }

        heads
            .into_iter()
            .map(|h| {
                Ok(DeliveryPlan {
                    lines: lines_by_plan.remove(&h.id).unwrap_or_default(),
                    status: DeliveryStatus::from_str(&h.status)
                        .map_err(AppError::Internal)?,
                    id: h.id,
                    delivery_date: h.delivery_date,
                    destination_location_id: h.destination_location_id,
                    customer_ids: Vec::new(),
                    note: h.note,
                    created_at: h.created_at,
                })
            })
            .collect()
    }

    async fn load_productions_in_range(&self, range: DateRange) -> AppResult<Vec<ProductionBatch>> {
        let heads = sqlx::query_as::<_, ProductionHeadRow>(
            r#"
            SELECT id, produced_at, output_item_id, output_quantity, note
            FROM production_batches
            WHERE produced_at::date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();
        let ingredients = sqlx::query_as::<_, ProductionIngredientRow>(
            "SELECT batch_id, item_id, quantity_used FROM production_ingredients WHERE batch_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_batch: HashMap<Uuid, Vec<ProductionIngredient>> = HashMap::new();
        for row in ingredients {
            by_batch.entry(row.batch_id).or_default().push(ProductionIngredient {
                item_id: row.item_id,
                quantity_used: row.quantity_used,
            });
        }

        Ok(heads
            .into_iter()
            .map(|h| ProductionBatch {
                ingredients: by_batch.remove(&h.id).unwrap_or_default(),
                id: h.id,
                produced_at: h.produced_at,
                output_item_id: h.output_item_id,
                output_quantity: h.output_quantity,
                note: h.note,
            })
            .collect())
    }
}

fn summarize(rows: &[DerivedInventoryRow]) -> InventorySummary {
    let mut summary = InventorySummary {
        total_items: rows.len(),
        ..Default::default()
    };
    for row in rows {
        match row.status {
            StockStatus::Critical => summary.critical += 1,
            StockStatus::Low => summary.low += 1,
            StockStatus::Normal => summary.normal += 1,
            StockStatus::High => summary.high += 1,
        }
    }
    summary
}

fn summarize_movements(movements: &HashMap<Uuid, MovementTotals>) -> MovementSummary {
    let mut summary = MovementSummary::default();
    for totals in movements.values() {
        summary.incoming += totals.incoming;
        summary.outgoing += totals.outgoing;
        summary.production += totals.production;
        summary.net_movement += totals.net();
    }
    summary
}
