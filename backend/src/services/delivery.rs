//! Delivery plan service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{DeliveryLine, DeliveryPlan, DeliveryStatus};

/// Delivery plan service
#[derive(Clone)]
pub struct DeliveryService {
    db: PgPool,
}

/// Input for creating a delivery plan
///
/// The destination is a retail location or one-or-more wholesale
/// customers, not both.
#[derive(Debug, Deserialize)]
pub struct CreateDeliveryInput {
    pub delivery_date: NaiveDate,
    pub destination_location_id: Option<Uuid>,
    pub customer_ids: Option<Vec<Uuid>>,
    pub note: Option<String>,
    pub lines: Vec<DeliveryLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryLineInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
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

impl DeliveryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateDeliveryInput) -> AppResult<DeliveryPlan> {
        let mut customer_ids = input.customer_ids.unwrap_or_default();
        customer_ids.sort();
        customer_ids.dedup();

        if input.destination_location_id.is_some() && !customer_ids.is_empty() {
            return Err(AppError::Validation {
                field: "destination".to_string(),
                message: "A plan targets a retail location or wholesale customers, not both"
                    .to_string(),
            });
        }
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A delivery plan must contain at least one line".to_string(),
            });
        }
        for line in &input.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Planned quantities must be positive".to_string(),
                });
            }
        }

        if !customer_ids.is_empty() {
            let known = sqlx::query_scalar::<_, i64>(
                "SELECT count(*) FROM wholesale_customers WHERE id = ANY($1)",
            )
            .bind(&customer_ids)
            .fetch_one(&self.db)
            .await?;
            if known != customer_ids.len() as i64 {
                return Err(AppError::Validation {
                    field: "customer_ids".to_string(),
                    message: "One or more customers do not exist".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let head = sqlx::query_as::<_, DeliveryHeadRow>(
            r#"
            INSERT INTO delivery_plans (status, delivery_date, destination_location_id, note)
            VALUES ('draft', $1, $2, $3)
            RETURNING id, status, delivery_date, destination_location_id, note, created_at
            "#,
        )
        .bind(input.delivery_date)
        .bind(input.destination_location_id)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        for customer_id in &customer_ids {
            sqlx::query(
                "INSERT INTO delivery_plan_customers (plan_id, customer_id) VALUES ($1, $2)",
            )
            .bind(head.id)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
        }

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO delivery_plan_lines (plan_id, item_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (plan_id, item_id)
                DO UPDATE SET quantity = delivery_plan_lines.quantity + EXCLUDED.quantity
                "#,
            )
            .bind(head.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            lines.push(DeliveryLine {
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }

        tx.commit().await?;
        to_plan(head, customer_ids, lines)
    }

    /// List plans, soonest first
    pub async fn list(&self) -> AppResult<Vec<DeliveryPlan>> {
        let heads = sqlx::query_as::<_, DeliveryHeadRow>(
            r#"
            SELECT id, status, delivery_date, destination_location_id, note, created_at
            FROM delivery_plans
            ORDER BY delivery_date, created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();

        let line_rows = sqlx::query_as::<_, DeliveryLineRow>(
            "SELECT plan_id, item_id, quantity FROM delivery_plan_lines WHERE plan_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let customer_rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT plan_id, customer_id FROM delivery_plan_customers WHERE plan_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_plan: HashMap<Uuid, Vec<DeliveryLine>> = HashMap::new();
        for row in line_rows {
            lines_by_plan.entry(row.plan_id).or_default().push(DeliveryLine {
                item_id: row.item_id,
                quantity: row.quantity,
            });
        }

        let mut customers_by_plan: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (plan_id, customer_id) in customer_rows {
            customers_by_plan.entry(plan_id).or_default().push(customer_id);
        }

        heads
            .into_iter()
            .map(|h| {
                let lines = lines_by_plan.remove(&h.id).unwrap_or_default();
                let customers = customers_by_plan.remove(&h.id).unwrap_or_default();
                to_plan(h, customers, lines)
            })
            .collect()
    }

    pub async fn get(&self, plan_id: Uuid) -> AppResult<DeliveryPlan> {
        let head = sqlx::query_as::<_, DeliveryHeadRow>(
            r#"
            SELECT id, status, delivery_date, destination_location_id, note, created_at
            FROM delivery_plans
            WHERE id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery plan".to_string()))?;

        let line_rows = sqlx::query_as::<_, DeliveryLineRow>(
            "SELECT plan_id, item_id, quantity FROM delivery_plan_lines WHERE plan_id = $1",
        )
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;

        let customers = sqlx::query_scalar::<_, Uuid>(
            "SELECT customer_id FROM delivery_plan_customers WHERE plan_id = $1",
        )
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(|row| DeliveryLine {
                item_id: row.item_id,
                quantity: row.quantity,
            })
            .collect();

        to_plan(head, customers, lines)
    }

    /// Confirm a draft plan so it counts toward outgoing movement
    pub async fn confirm(&self, plan_id: Uuid) -> AppResult<DeliveryPlan> {
        let plan = self.get(plan_id).await?;
        if plan.status != DeliveryStatus::Draft {
            return Err(AppError::InvalidStateTransition(format!(
                "Only draft plans can be confirmed; plan is {}",
                plan.status.as_str()
            )));
        }

        sqlx::query("UPDATE delivery_plans SET status = 'confirmed' WHERE id = $1")
            .bind(plan_id)
            .execute(&self.db)
            .await?;

        self.get(plan_id).await
    }
}

fn to_plan(
    head: DeliveryHeadRow,
    customer_ids: Vec<Uuid>,
    lines: Vec<DeliveryLine>,
) -> AppResult<DeliveryPlan> {
    Ok(DeliveryPlan {
        status: DeliveryStatus::from_str(&head.status).map_err(AppError::Internal)?,
        id: head.id,
        delivery_date: head.delivery_date,
        destination_location_id: head.destination_location_id,
        customer_ids,
        note: head.note,
        created_at: head.created_at,
        lines,
    })
}
