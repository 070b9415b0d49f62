//! Wholesale customer service

use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::WholesaleCustomer;

/// Wholesale customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Input for creating a wholesale customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    contact: Option<String>,
}

impl From<CustomerRow> for WholesaleCustomer {
    fn from(r: CustomerRow) -> Self {
        WholesaleCustomer {
            id: r.id,
            name: r.name,
            contact: r.contact,
        }
    }
}

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateCustomerInput) -> AppResult<WholesaleCustomer> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Customer name is required".to_string(),
            });
        }

        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO wholesale_customers (name, contact)
            VALUES ($1, $2)
            RETURNING id, name, contact
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.contact)
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

    pub async fn list(&self) -> AppResult<Vec<WholesaleCustomer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, contact FROM wholesale_customers ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
