use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Farm {
    pub id: Uuid,
    pub user_id: Uuid, // Foreign key to User
    pub name: String,
    #[ts(type = "unknown | null")]
    pub view: Option<Json<Value>>,
    #[ts(type = "unknown | null")]
    pub preferred_center: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both create and full update requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFarm {
    pub name: String,
    #[ts(type = "unknown | null")]
    pub view: Option<Value>,
    #[ts(type = "unknown | null")]
    pub preferred_center: Option<Value>,
}

pub type UpdateFarm = CreateFarm;

const FARM_COLUMNS: &str =
    "id, user_id, name, view, preferred_center, created_at, updated_at";

impl Farm {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateFarm,
        farm_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Farm>(&format!(
            "INSERT INTO farms (id, user_id, name, view, preferred_center)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FARM_COLUMNS}"
        ))
        .bind(farm_id)
        .bind(user_id)
        .bind(&data.name)
        .bind(data.view.as_ref().map(Json))
        .bind(data.preferred_center.as_ref().map(Json))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>(&format!(
            "SELECT {FARM_COLUMNS} FROM farms WHERE user_id = $1 ORDER BY name ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Look a farm up by id, but only if `user_id` owns it.
    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>(&format!(
            "SELECT {FARM_COLUMNS} FROM farms WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateFarm,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>(&format!(
            "UPDATE farms
             SET name = $3, view = $4, preferred_center = $5,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND user_id = $2
             RETURNING {FARM_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&data.name)
        .bind(data.view.as_ref().map(Json))
        .bind(data.preferred_center.as_ref().map(Json))
        .fetch_optional(pool)
        .await
    }

    /// Child rows (map features, tasks, movements, assets) go with it.
    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM farms WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
