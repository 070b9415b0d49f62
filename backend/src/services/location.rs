//! Location service: stores, the factory hub, and per-item targets

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Location, LocationItemTarget, LocationKind};

/// Location service
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

/// Input for creating a location
#[derive(Debug, Deserialize)]
pub struct CreateLocationInput {
    pub name: String,
    pub kind: LocationKind,
    pub is_hub: Option<bool>,
    /// Allocation iteration order, ascending; lower goes first
    pub priority: Option<i32>,
}

/// Input for updating a location
#[derive(Debug, Deserialize)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub is_hub: Option<bool>,
}

/// One target entry for a location's replenishment profile
#[derive(Debug, Deserialize)]
pub struct TargetInput {
    pub item_id: Uuid,
    pub target_quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    kind: String,
    is_hub: bool,
    priority: i32,
    created_at: DateTime<Utc>,
}

fn to_location(r: LocationRow) -> AppResult<Location> {
    let kind = match r.kind.as_str() {
        "factory" => LocationKind::Factory,
        "store" => LocationKind::Store,
        other => {
            return Err(AppError::Internal(format!(
                "Unknown location kind: {}",
                other
            )))
        }
    };
    Ok(Location {
        id: r.id,
        name: r.name,
        kind,
        is_hub: r.is_hub,
        priority: r.priority,
        created_at: r.created_at,
    })
}

fn kind_str(kind: LocationKind) -> &'static str {
    match kind {
        LocationKind::Factory => "factory",
        LocationKind::Store => "store",
    }
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateLocationInput) -> AppResult<Location> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Location name is required".to_string(),
            });
        }

        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (name, kind, is_hub, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, kind, is_hub, priority, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(kind_str(input.kind))
        .bind(input.is_hub.unwrap_or(false))
        .bind(input.priority.unwrap_or(100))
        .fetch_one(&self.db)
        .await?;

        to_location(row)
    }

    /// List locations in allocation order
    pub async fn list(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, name, kind, is_hub, priority, created_at
            FROM locations
            ORDER BY priority, created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(to_location).collect()
    }

    pub async fn get(&self, location_id: Uuid) -> AppResult<Location> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, kind, is_hub, priority, created_at FROM locations WHERE id = $1",
        )
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))?;

        to_location(row)
    }

    pub async fn update(
        &self,
        location_id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<Location> {
        let existing = self.get(location_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let priority = input.priority.unwrap_or(existing.priority);
        let is_hub = input.is_hub.unwrap_or(existing.is_hub);

        if name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Location name is required".to_string(),
            });
        }

        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            UPDATE locations
            SET name = $1, priority = $2, is_hub = $3
            WHERE id = $4
            RETURNING id, name, kind, is_hub, priority, created_at
            "#,
        )
        .bind(name.trim())
        .bind(priority)
        .bind(is_hub)
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        to_location(row)
    }

    /// Per-item target quantities driving the deficit allocator
    pub async fn get_targets(&self, location_id: Uuid) -> AppResult<Vec<LocationItemTarget>> {
        // Ensure the location exists so a bad id is 404 rather than []
        self.get(location_id).await?;

        let targets = sqlx::query_as::<_, (Uuid, Uuid, Decimal)>(
            r#"
            SELECT location_id, item_id, target_quantity
            FROM location_item_targets
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(targets
            .into_iter()
            .map(|(location_id, item_id, target_quantity)| LocationItemTarget {
                location_id,
                item_id,
                target_quantity,
            })
            .collect())
    }

    /// Replace a location's replenishment profile
    pub async fn set_targets(
        &self,
        location_id: Uuid,
        targets: Vec<TargetInput>,
    ) -> AppResult<Vec<LocationItemTarget>> {
        self.get(location_id).await?;

        for target in &targets {
            if target.target_quantity < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "target_quantity".to_string(),
                    message: "Target quantities cannot be negative".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM location_item_targets WHERE location_id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await?;

        for target in &targets {
            sqlx::query(
                r#"
                INSERT INTO location_item_targets (location_id, item_id, target_quantity)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(location_id)
            .bind(target.item_id)
            .bind(target.target_quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_targets(location_id).await
    }
}
