//! Stocktake service for recording and loading inventory snapshots

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Stocktake, StocktakeLine};

/// How far back snapshot queries look when deriving baselines
const SNAPSHOT_WINDOW_DAYS: i64 = 90;

/// Bounded recent window used for a location's last observed quantities
const SNAPSHOTS_PER_LOCATION: i64 = 20;

/// Stocktake service
#[derive(Clone)]
pub struct StocktakeService {
    db: PgPool,
}

/// Input for recording a stocktake
#[derive(Debug, Deserialize)]
pub struct RecordStocktakeInput {
    pub location_id: Uuid,
    pub is_master: Option<bool>,
    pub note: Option<String>,
    pub lines: Vec<StocktakeLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct StocktakeLineInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct StocktakeRow {
    id: Uuid,
    location_id: Uuid,
    taken_at: DateTime<Utc>,
    is_master: bool,
    note: Option<String>,
}

#[derive(Debug, FromRow)]
struct StocktakeLineRow {
    stocktake_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
}

impl StocktakeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a counted snapshot at a location
    pub async fn record(&self, user_id: Uuid, input: RecordStocktakeInput) -> AppResult<Stocktake> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A stocktake must count at least one item".to_string(),
            });
        }
        for line in &input.lines {
            if line.quantity < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Counted quantities cannot be negative".to_string(),
                });
            }
        }

        let location_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)")
                .bind(input.location_id)
                .fetch_one(&self.db)
                .await?;
        if !location_exists {
            return Err(AppError::NotFound("Location".to_string()));
        }

        let is_master = input.is_master.unwrap_or(false);

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, StocktakeRow>(
            r#"
            INSERT INTO stocktakes (location_id, is_master, note, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, location_id, taken_at, is_master, note
            "#,
        )
        .bind(input.location_id)
        .bind(is_master)
        .bind(&input.note)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        for line in &input.lines {
            sqlx::query(
                "INSERT INTO stocktake_lines (stocktake_id, item_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(row.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Stocktake {
            id: row.id,
            location_id: row.location_id,
            taken_at: row.taken_at,
            is_master: row.is_master,
            note: row.note,
            lines: input
                .lines
                .into_iter()
                .map(|l| StocktakeLine {
                    item_id: l.item_id,
                    quantity: l.quantity,
                })
                .collect(),
        })
    }

    /// List recent stocktakes, newest first, with their lines
    pub async fn list_recent(&self, location_id: Option<Uuid>) -> AppResult<Vec<Stocktake>> {
        let since = Utc::now() - Duration::days(SNAPSHOT_WINDOW_DAYS);
        let rows = sqlx::query_as::<_, StocktakeRow>(
            r#"
            SELECT id, location_id, taken_at, is_master, note
            FROM stocktakes
            WHERE taken_at >= $1 AND ($2::uuid IS NULL OR location_id = $2)
            ORDER BY taken_at DESC
            LIMIT 200
            "#,
        )
        .bind(since)
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        attach_lines(&self.db, rows).await
    }
}

/// Load recent snapshots across all locations for baseline derivation
pub(crate) async fn load_recent_stocktakes(db: &PgPool) -> AppResult<Vec<Stocktake>> {
    let since = Utc::now() - Duration::days(SNAPSHOT_WINDOW_DAYS);
    let rows = sqlx::query_as::<_, StocktakeRow>(
        r#"
        SELECT id, location_id, taken_at, is_master, note
        FROM stocktakes
        WHERE taken_at >= $1
        ORDER BY taken_at DESC
        LIMIT 500
        "#,
    )
    .bind(since)
    .fetch_all(db)
    .await?;

    attach_lines(db, rows).await
}

/// Load the last few snapshots per location, for the allocator's view of
/// each location's current quantities
pub(crate) async fn load_recent_for_locations(
    db: &PgPool,
    location_ids: &[Uuid],
) -> AppResult<Vec<Stocktake>> {
    if location_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, StocktakeRow>(
        r#"
        SELECT id, location_id, taken_at, is_master, note
        FROM (
            SELECT id, location_id, taken_at, is_master, note,
                   ROW_NUMBER() OVER (PARTITION BY location_id ORDER BY taken_at DESC) AS rn
            FROM stocktakes
            WHERE location_id = ANY($1)
        ) ranked
        WHERE rn <= $2
        ORDER BY taken_at DESC
        "#,
    )
    .bind(location_ids)
    .bind(SNAPSHOTS_PER_LOCATION)
    .fetch_all(db)
    .await?;

    attach_lines(db, rows).await
}

/// Fetch lines for a batch of snapshot heads and assemble full models
async fn attach_lines(db: &PgPool, rows: Vec<StocktakeRow>) -> AppResult<Vec<Stocktake>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let line_rows = sqlx::query_as::<_, StocktakeLineRow>(
        "SELECT stocktake_id, item_id, quantity FROM stocktake_lines WHERE stocktake_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut lines_by_id: HashMap<Uuid, Vec<StocktakeLine>> = HashMap::new();
    for line in line_rows {
        lines_by_id
            .entry(line.stocktake_id)
            .or_default()
            .push(StocktakeLine {
                item_id: line.item_id,
                quantity: line.quantity,
            });
    }

    Ok(rows
        .into_iter()
        .map(|r| Stocktake {
            lines: lines_by_id.remove(&r.id).unwrap_or_default(),
            id: r.id,
            location_id: r.location_id,
            taken_at: r.taken_at,
            is_master: r.is_master,
            note: r.note,
        })
        .collect())
}
