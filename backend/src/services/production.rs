//! Production batch service

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{ProductionBatch, ProductionIngredient};

/// Production batch service
#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
}

/// Input for recording a production run
#[derive(Debug, Deserialize)]
pub struct RecordProductionInput {
    pub produced_at: Option<DateTime<Utc>>,
    pub output_item_id: Option<Uuid>,
    pub output_quantity: Option<Decimal>,
    pub note: Option<String>,
    pub ingredients: Vec<IngredientInput>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    pub item_id: Uuid,
    pub quantity_used: Decimal,
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
struct IngredientRow {
    batch_id: Uuid,
    item_id: Uuid,
    quantity_used: Decimal,
}

impl ProductionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a production batch with its ingredient consumption
    pub async fn record(&self, input: RecordProductionInput) -> AppResult<ProductionBatch> {
        if input.ingredients.is_empty() {
            return Err(AppError::Validation {
                field: "ingredients".to_string(),
                message: "A production batch must consume at least one ingredient".to_string(),
            });
        }
        for ingredient in &input.ingredients {
            if ingredient.quantity_used <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity_used".to_string(),
                    message: "Ingredient quantities must be positive".to_string(),
                });
            }
        }

        let produced_at = input.produced_at.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;

        let head = sqlx::query_as::<_, ProductionHeadRow>(
            r#"
            INSERT INTO production_batches (produced_at, output_item_id, output_quantity, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id, produced_at, output_item_id, output_quantity, note
            "#,
        )
        .bind(produced_at)
        .bind(input.output_item_id)
        .bind(input.output_quantity)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        for ingredient in &input.ingredients {
            sqlx::query(
                r#"
                INSERT INTO production_ingredients (batch_id, item_id, quantity_used)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(head.id)
            .bind(ingredient.item_id)
            .bind(ingredient.quantity_used)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(ProductionBatch {
            id: head.id,
            produced_at: head.produced_at,
            output_item_id: head.output_item_id,
            output_quantity: head.output_quantity,
            note: head.note,
            ingredients: input
                .ingredients
                .into_iter()
                .map(|i| ProductionIngredient {
                    item_id: i.item_id,
                    quantity_used: i.quantity_used,
                })
                .collect(),
        })
    }

    /// List batches from the last 90 days, newest first
    pub async fn list_recent(&self) -> AppResult<Vec<ProductionBatch>> {
        let since = Utc::now() - Duration::days(90);
        let heads = sqlx::query_as::<_, ProductionHeadRow>(
            r#"
            SELECT id, produced_at, output_item_id, output_quantity, note
            FROM production_batches
            WHERE produced_at >= $1
            ORDER BY produced_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        if heads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = heads.iter().map(|h| h.id).collect();
        let ingredient_rows = sqlx::query_as::<_, IngredientRow>(
            "SELECT batch_id, item_id, quantity_used FROM production_ingredients WHERE batch_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_batch: HashMap<Uuid, Vec<ProductionIngredient>> = HashMap::new();
        for row in ingredient_rows {
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
