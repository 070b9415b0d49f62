//! Item catalogue service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Item, ItemCategory};

/// Item service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Input for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub unit: String,
    pub target_stock: Decimal,
}

/// Input for creating an item category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// Input for updating an item; absent fields keep their current value
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit: Option<String>,
    pub target_stock: Option<Decimal>,
    pub is_active: Option<bool>,
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

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        Item {
            id: r.id,
            name: r.name,
            category_id: r.category_id,
            unit: r.unit,
            target_stock: r.target_stock,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateItemInput) -> AppResult<Item> {
        validate_item_fields(&input.name, &input.unit, input.target_stock)?;

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO items (name, category_id, unit, target_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category_id, unit, target_stock, is_active, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.category_id)
        .bind(input.unit.trim())
        .bind(input.target_stock)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("name".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(row.into())
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, category_id, unit, target_stock, is_active, created_at
            FROM items
            WHERE $1 OR is_active = true
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, item_id: Uuid) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, category_id, unit, target_stock, is_active, created_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(row.into())
    }

    pub async fn update(&self, item_id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        let existing = self.get(item_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let unit = input.unit.unwrap_or(existing.unit);
        let category_id = input.category_id.or(existing.category_id);
        let target_stock = input.target_stock.unwrap_or(existing.target_stock);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        validate_item_fields(&name, &unit, target_stock)?;

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE items
            SET name = $1, category_id = $2, unit = $3, target_stock = $4, is_active = $5
            WHERE id = $6
            RETURNING id, name, category_id, unit, target_stock, is_active, created_at
            "#,
        )
        .bind(name.trim())
        .bind(category_id)
        .bind(unit.trim())
        .bind(target_stock)
        .bind(is_active)
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    pub async fn list_categories(&self) -> AppResult<Vec<ItemCategory>> {
        let categories = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM item_categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories
            .into_iter()
            .map(|(id, name)| ItemCategory { id, name })
            .collect())
    }

    pub async fn create_category(&self, input: CreateCategoryInput) -> AppResult<ItemCategory> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Category name is required".to_string(),
            });
        }

        let (id, name) = sqlx::query_as::<_, (Uuid, String)>(
            "INSERT INTO item_categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("name".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(ItemCategory { id, name })
    }

    /// Soft-delete: deactivate the item so history stays intact
    pub async fn delete(&self, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE items SET is_active = false WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }
}

fn validate_item_fields(name: &str, unit: &str, target_stock: Decimal) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: "Item name is required".to_string(),
        });
    }
    if unit.trim().is_empty() {
        return Err(AppError::Validation {
            field: "unit".to_string(),
            message: "Unit label is required".to_string(),
        });
    }
    if target_stock < Decimal::ZERO {
        return Err(AppError::Validation {
            field: "target_stock".to_string(),
            message: "Target stock cannot be negative".to_string(),
        });
    }
    Ok(())
}
