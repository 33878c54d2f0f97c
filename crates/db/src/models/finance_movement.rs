use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Direction of a movement. The stored and wire values are the labels the
/// web client shows (`Ingreso` / `Gasto`).
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display)]
pub enum MovementType {
    #[sqlx(rename = "Ingreso")]
    #[serde(rename = "Ingreso")]
    #[strum(serialize = "Ingreso")]
    Income,
    #[sqlx(rename = "Gasto")]
    #[serde(rename = "Gasto")]
    #[strum(serialize = "Gasto")]
    Expense,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FinanceMovement {
    pub id: Uuid,
    pub farm_id: Uuid, // Foreign key to Farm
    pub date: NaiveDate,
    pub concept: String,
    pub category: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: f64,
    pub note: Option<String>,
    pub invoice_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinanceMovement {
    pub fn is_expense(&self) -> bool {
        self.movement_type == MovementType::Expense
    }

    pub fn has_invoice(&self) -> bool {
        self.invoice_number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }
}

/// Grouping key for categories: trimmed, Unicode lower case.
pub fn category_key(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Body of both create and full update requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFinanceMovement {
    pub date: NaiveDate,
    pub concept: String,
    pub category: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: f64,
    pub note: Option<String>,
    pub invoice_number: Option<String>,
}

pub type UpdateFinanceMovement = CreateFinanceMovement;

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct MovementFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub movement_type: Option<MovementType>,
    pub category: Option<String>,
}

impl MovementFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, farm_id, date, concept, category, movement_type, amount, note, invoice_number, created_at, updated_at";

impl FinanceMovement {
    /// Movements matching `filter`, newest first. Date bounds are inclusive.
    pub async fn find_by_farm_id(
        pool: &SqlitePool,
        farm_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FinanceMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS}
             FROM finance_movements
             WHERE farm_id = $1
               AND ($2 IS NULL OR date >= $2)
               AND ($3 IS NULL OR date <= $3)
               AND ($4 IS NULL OR movement_type = $4)
               AND ($5 IS NULL OR lower(category) = lower($5))
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(farm_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.movement_type)
        .bind(filter.category.as_deref())
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        farm_id: Uuid,
        data: &CreateFinanceMovement,
        movement_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FinanceMovement>(&format!(
            "INSERT INTO finance_movements (id, farm_id, date, concept, category, movement_type, amount, note, invoice_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(movement_id)
        .bind(farm_id)
        .bind(data.date)
        .bind(&data.concept)
        .bind(&data.category)
        .bind(data.movement_type)
        .bind(data.amount)
        .bind(&data.note)
        .bind(&data.invoice_number)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        data: &UpdateFinanceMovement,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FinanceMovement>(&format!(
            "UPDATE finance_movements
             SET date = $3, concept = $4, category = $5, movement_type = $6, amount = $7,
                 note = $8, invoice_number = $9, updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND farm_id = $2
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(farm_id)
        .bind(data.date)
        .bind(&data.concept)
        .bind(&data.category)
        .bind(data.movement_type)
        .bind(data.amount)
        .bind(&data.note)
        .bind(&data.invoice_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, farm_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM finance_movements WHERE id = $1 AND farm_id = $2")
            .bind(id)
            .bind(farm_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
