use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// The three kinds of geometry a farm map is made of. Each lives in its own
/// table; only zones carry `components`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MapFeatureKind {
    Point,
    Line,
    Zone,
}

impl MapFeatureKind {
    pub const ALL: [MapFeatureKind; 3] = [Self::Point, Self::Line, Self::Zone];

    fn table(self) -> &'static str {
        match self {
            Self::Point => "map_points",
            Self::Line => "map_lines",
            Self::Zone => "map_zones",
        }
    }

    pub fn has_components(self) -> bool {
        matches!(self, Self::Zone)
    }

    fn columns(self) -> &'static str {
        if self.has_components() {
            "id, farm_id, data, components, created_at, updated_at"
        } else {
            "id, farm_id, data, NULL AS components, created_at, updated_at"
        }
    }

    /// Path segment used by the HTTP routes.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Point => "points",
            Self::Line => "lines",
            Self::Zone => "zones",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct MapFeature {
    pub id: Uuid,
    pub farm_id: Uuid, // Foreign key to Farm
    #[ts(type = "unknown")]
    pub data: Json<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown | null")]
    pub components: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MapFeature {
    /// Display label of a zone: `data.name`, falling back to
    /// `data.properties.name`.
    pub fn label(&self) -> Option<String> {
        let data = &self.data.0;
        data.get("name")
            .and_then(Value::as_str)
            .or_else(|| {
                data.get("properties")
                    .and_then(|p| p.get("name"))
                    .and_then(Value::as_str)
            })
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateMapFeature {
    #[ts(type = "unknown")]
    pub data: Value,
    #[serde(default)]
    #[ts(type = "unknown | null")]
    pub components: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct FarmMap {
    pub points: Vec<MapFeature>,
    pub lines: Vec<MapFeature>,
    pub zones: Vec<MapFeature>,
}

/// Whole-map replacement body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ReplaceFarmMap {
    #[serde(default)]
    pub points: Vec<CreateMapFeature>,
    #[serde(default)]
    pub lines: Vec<CreateMapFeature>,
    #[serde(default)]
    pub zones: Vec<CreateMapFeature>,
}

impl ReplaceFarmMap {
    pub fn features(&self, kind: MapFeatureKind) -> &[CreateMapFeature] {
        match kind {
            MapFeatureKind::Point => &self.points,
            MapFeatureKind::Line => &self.lines,
            MapFeatureKind::Zone => &self.zones,
        }
    }
}

impl MapFeature {
    pub async fn find_by_farm_id(
        pool: &SqlitePool,
        kind: MapFeatureKind,
        farm_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MapFeature>(&format!(
            "SELECT {} FROM {} WHERE farm_id = $1 ORDER BY created_at ASC, rowid ASC",
            kind.columns(),
            kind.table()
        ))
        .bind(farm_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        kind: MapFeatureKind,
        id: Uuid,
        farm_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MapFeature>(&format!(
            "SELECT {} FROM {} WHERE id = $1 AND farm_id = $2",
            kind.columns(),
            kind.table()
        ))
        .bind(id)
        .bind(farm_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        kind: MapFeatureKind,
        farm_id: Uuid,
        data: &CreateMapFeature,
        feature_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = if kind.has_components() {
            format!(
                "INSERT INTO {} (id, farm_id, data, components) VALUES ($1, $2, $3, $4) RETURNING {}",
                kind.table(),
                kind.columns()
            )
        } else {
            format!(
                "INSERT INTO {} (id, farm_id, data) VALUES ($1, $2, $3) RETURNING {}",
                kind.table(),
                kind.columns()
            )
        };
        let mut query = sqlx::query_as::<_, MapFeature>(&sql)
            .bind(feature_id)
            .bind(farm_id)
            .bind(Json(&data.data));
        if kind.has_components() {
            query = query.bind(data.components.as_ref().map(Json));
        }
        query.fetch_one(executor).await
    }

    pub async fn update(
        pool: &SqlitePool,
        kind: MapFeatureKind,
        id: Uuid,
        farm_id: Uuid,
        data: &CreateMapFeature,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = if kind.has_components() {
            format!(
                "UPDATE {} SET data = $3, components = $4, updated_at = datetime('now', 'subsec')
                 WHERE id = $1 AND farm_id = $2 RETURNING {}",
                kind.table(),
                kind.columns()
            )
        } else {
            format!(
                "UPDATE {} SET data = $3, updated_at = datetime('now', 'subsec')
                 WHERE id = $1 AND farm_id = $2 RETURNING {}",
                kind.table(),
                kind.columns()
            )
        };
        let mut query = sqlx::query_as::<_, MapFeature>(&sql)
            .bind(id)
            .bind(farm_id)
            .bind(Json(&data.data));
        if kind.has_components() {
            query = query.bind(data.components.as_ref().map(Json));
        }
        query.fetch_optional(pool).await
    }

    pub async fn delete(
        pool: &SqlitePool,
        kind: MapFeatureKind,
        id: Uuid,
        farm_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND farm_id = $2",
            kind.table()
        ))
        .bind(id)
        .bind(farm_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_farm_id<'e, E>(
        executor: E,
        kind: MapFeatureKind,
        farm_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE farm_id = $1", kind.table()))
            .bind(farm_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

impl FarmMap {
    pub async fn load(pool: &SqlitePool, farm_id: Uuid) -> Result<Self, sqlx::Error> {
        Ok(Self {
            points: MapFeature::find_by_farm_id(pool, MapFeatureKind::Point, farm_id).await?,
            lines: MapFeature::find_by_farm_id(pool, MapFeatureKind::Line, farm_id).await?,
            zones: MapFeature::find_by_farm_id(pool, MapFeatureKind::Zone, farm_id).await?,
        })
    }

    /// Swap the farm's whole map for `data` in a single transaction.
    pub async fn replace(
        pool: &SqlitePool,
        farm_id: Uuid,
        data: &ReplaceFarmMap,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for kind in MapFeatureKind::ALL {
            MapFeature::delete_by_farm_id(&mut *tx, kind, farm_id).await?;
            for feature in data.features(kind) {
                MapFeature::create(&mut *tx, kind, farm_id, feature, Uuid::new_v4()).await?;
            }
        }
        tx.commit().await?;
        Self::load(pool, farm_id).await
    }
}
