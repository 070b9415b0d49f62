//! Purchase order service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::AllocationService;
use shared::allocation::ReceivedItem;
use shared::models::{OrderLine, OrderStatus, PurchaseOrder};

/// Purchase order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub supplier_name: String,
    pub expected_date: NaiveDate,
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Input for marking an order received
///
/// Each entry identifies an item either directly or through one of the
/// order's lines, with the quantity actually received.
#[derive(Debug, Deserialize)]
pub struct ReceiveOrderInput {
    pub received_items: Vec<ReceivedItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct ReceivedItemInput {
    pub item_id: Option<Uuid>,
    pub order_line_id: Option<Uuid>,
    pub received_quantity: Decimal,
}

/// Response after receiving an order
#[derive(Debug, Serialize)]
pub struct ReceiveOrderResponse {
    pub message: String,
    pub order_id: Uuid,
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

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase order with its lines
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<PurchaseOrder> {
        if input.supplier_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "supplier_name".to_string(),
                message: "Supplier name is required".to_string(),
            });
        }
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "An order must contain at least one line".to_string(),
            });
        }
        for line in &input.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Ordered quantities must be positive".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let head = sqlx::query_as::<_, OrderHeadRow>(
            r#"
            INSERT INTO purchase_orders (supplier_name, status, expected_date)
            VALUES ($1, 'pending', $2)
            RETURNING id, supplier_name, status, expected_date, created_at
            "#,
        )
        .bind(input.supplier_name.trim())
        .bind(input.expected_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO purchase_order_lines (order_id, item_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
            )
            .bind(head.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(OrderLine {
                id,
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }

        tx.commit().await?;
        to_order(head, lines)
    }

    /// List orders, newest expected first
    pub async fn list(&self) -> AppResult<Vec<PurchaseOrder>> {
        let heads = sqlx::query_as::<_, OrderHeadRow>(
            r#"
            SELECT id, supplier_name, status, expected_date, created_at
            FROM purchase_orders
            ORDER BY expected_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();
        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, item_id, quantity FROM purchase_order_lines WHERE order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            lines_by_order.entry(row.order_id).or_default().push(OrderLine {
                id: row.id,
                item_id: row.item_id,
                quantity: row.quantity,
            });
        }

        heads
            .into_iter()
            .map(|h| {
                let lines = lines_by_order.remove(&h.id).unwrap_or_default();
                to_order(h, lines)
            })
            .collect()
    }

    /// Get one order with its lines
    pub async fn get(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let head = sqlx::query_as::<_, OrderHeadRow>(
            r#"
            SELECT id, supplier_name, status, expected_date, created_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, item_id, quantity FROM purchase_order_lines WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(|row| OrderLine {
                id: row.id,
                item_id: row.item_id,
                quantity: row.quantity,
            })
            .collect();

        to_order(head, lines)
    }

    /// Mark an order received, record the stock-receipt snapshot at the
    /// hub, then run the deficit allocator
    ///
    /// The status change and the receipt snapshot commit together; the
    /// allocator runs afterwards best-effort and its failure is only
    /// logged, the receipt is never rolled back.
    pub async fn receive(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        input: ReceiveOrderInput,
    ) -> AppResult<ReceiveOrderResponse> {
        if input.received_items.is_empty() {
            return Err(AppError::Validation {
                field: "received_items".to_string(),
                message: "At least one received item is required".to_string(),
            });
        }

        let order = self.get(order_id).await?;
        if !order.status.counts_as_incoming() {
            return Err(AppError::InvalidStateTransition(format!(
                "Order is already {}",
                order.status.as_str()
            )));
        }

        let received = resolve_received_items(&order, &input.received_items)?;

        let hub_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM locations WHERE is_hub = true ORDER BY priority, created_at LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hub location".to_string()))?;

        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE purchase_orders SET status = 'received', received_at = now() WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let snapshot_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stocktakes (location_id, is_master, note, created_by)
            VALUES ($1, false, $2, $3)
            RETURNING id
            "#,
        )
        .bind(hub_id)
        .bind(format!("Receipt of order {}", order_id))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &received {
            sqlx::query(
                "INSERT INTO stocktake_lines (stocktake_id, item_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(snapshot_id)
            .bind(item.item_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        // Best-effort deficit scheduling; the receipt is already committed
        let allocator = AllocationService::new(self.db.clone());
        match allocator.schedule_deficit_deliveries(&received).await {
            Ok(allocations) => {
                tracing::info!(
                    "Order {} received; {} deficit allocation(s) scheduled",
                    order_id,
                    allocations.len()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Deficit scheduling failed after receiving order {}: {}",
                    order_id,
                    e
                );
            }
        }

        Ok(ReceiveOrderResponse {
            message: "Order received".to_string(),
            order_id,
        })
    }
}

/// Resolve receipt entries to items, validating quantities and references
fn resolve_received_items(
    order: &PurchaseOrder,
    inputs: &[ReceivedItemInput],
) -> AppResult<Vec<ReceivedItem>> {
    let mut received: Vec<ReceivedItem> = Vec::with_capacity(inputs.len());

    for entry in inputs {
        if entry.received_quantity <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "received_quantity".to_string(),
                message: "Received quantities must be positive".to_string(),
            });
        }

        let item_id = match (entry.item_id, entry.order_line_id) {
            (Some(item_id), _) => item_id,
            (None, Some(line_id)) => order
                .lines
                .iter()
                .find(|l| l.id == line_id)
                .map(|l| l.item_id)
                .ok_or_else(|| AppError::Validation {
                    field: "order_line_id".to_string(),
                    message: "Order line does not belong to this order".to_string(),
                })?,
            (None, None) => {
                return Err(AppError::Validation {
                    field: "received_items".to_string(),
                    message: "Each entry needs an item_id or an order_line_id".to_string(),
                })
            }
        };

        received.push(ReceivedItem {
            item_id,
            quantity: entry.received_quantity,
        });
    }

    Ok(received)
}

fn to_order(head: OrderHeadRow, lines: Vec<OrderLine>) -> AppResult<PurchaseOrder> {
    Ok(PurchaseOrder {
        status: OrderStatus::from_str(&head.status).map_err(AppError::Internal)?,
        id: head.id,
        supplier_name: head.supplier_name,
        expected_date: head.expected_date,
        created_at: head.created_at,
        lines,
    })
}
