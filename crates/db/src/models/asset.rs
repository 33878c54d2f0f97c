use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Asset {
    pub id: Uuid,
    pub farm_id: Uuid, // Foreign key to Farm
    pub name: String,
    pub category: String,
    pub purchase_value: f64,
    pub purchase_date: NaiveDate,
    pub useful_life_years: i32,
    pub residual_value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Straight-line depreciation of an asset at a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Depreciation {
    pub as_of: NaiveDate,
    pub annual_depreciation: f64,
    pub accumulated_depreciation: f64,
    pub book_value: f64,
    pub remaining_life_years: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssetWithDepreciation {
    #[serde(flatten)]
    #[ts(flatten)]
    pub asset: Asset,
    pub depreciation: Depreciation,
}

impl std::ops::Deref for AssetWithDepreciation {
    type Target = Asset;
    fn deref(&self) -> &Self::Target {
        &self.asset
    }
}

impl Asset {
    pub fn years_in_service(&self, as_of: NaiveDate) -> f64 {
        let days = (as_of - self.purchase_date).num_days().max(0);
        days as f64 / DAYS_PER_YEAR
    }

    pub fn depreciation(&self, as_of: NaiveDate) -> Depreciation {
        let depreciable = (self.purchase_value - self.residual_value).max(0.0);
        let life = f64::from(self.useful_life_years.max(1));
        let annual = depreciable / life;
        let elapsed = self.years_in_service(as_of);
        let accumulated = (annual * elapsed).min(depreciable);
        Depreciation {
            as_of,
            annual_depreciation: annual,
            accumulated_depreciation: accumulated,
            book_value: self.purchase_value - accumulated,
            remaining_life_years: (life - elapsed).max(0.0),
        }
    }

    pub fn with_depreciation(self, as_of: NaiveDate) -> AssetWithDepreciation {
        let depreciation = self.depreciation(as_of);
        AssetWithDepreciation {
            asset: self,
            depreciation,
        }
    }
}

/// Body of both create and full update requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateAsset {
    pub name: String,
    pub category: String,
    pub purchase_value: f64,
    pub purchase_date: NaiveDate,
    pub useful_life_years: i32,
    #[serde(default)]
    pub residual_value: f64,
}

pub type UpdateAsset = CreateAsset;

const ASSET_COLUMNS: &str = "id, farm_id, name, category, purchase_value, purchase_date, useful_life_years, residual_value, created_at, updated_at";

impl Asset {
    pub async fn find_by_farm_id(
        pool: &SqlitePool,
        farm_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE farm_id = $1 ORDER BY purchase_date ASC, name ASC"
        ))
        .bind(farm_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 AND farm_id = $2"
        ))
        .bind(id)
        .bind(farm_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        farm_id: Uuid,
        data: &CreateAsset,
        asset_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Asset>(&format!(
            "INSERT INTO assets (id, farm_id, name, category, purchase_value, purchase_date, useful_life_years, residual_value)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ASSET_COLUMNS}"
        ))
        .bind(asset_id)
        .bind(farm_id)
        .bind(&data.name)
        .bind(&data.category)
        .bind(data.purchase_value)
        .bind(data.purchase_date)
        .bind(data.useful_life_years)
        .bind(data.residual_value)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        data: &UpdateAsset,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Asset>(&format!(
            "UPDATE assets
             SET name = $3, category = $4, purchase_value = $5, purchase_date = $6,
                 useful_life_years = $7, residual_value = $8,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND farm_id = $2
             RETURNING {ASSET_COLUMNS}"
        ))
        .bind(id)
        .bind(farm_id)
        .bind(&data.name)
        .bind(&data.category)
        .bind(data.purchase_value)
        .bind(data.purchase_date)
        .bind(data.useful_life_years)
        .bind(data.residual_value)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, farm_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND farm_id = $2")
            .bind(id)
            .bind(farm_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tractor(purchase_date: NaiveDate) -> Asset {
        Asset {
            id: Uuid::new_v4(),
            farm_id: Uuid::new_v4(),
            name: "Tractor".to_string(),
            category: "Maquinaria".to_string(),
            purchase_value: 50_000.0,
            purchase_date,
            useful_life_years: 10,
            residual_value: 10_000.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn straight_line_depreciation() {
        let asset = tractor(date(2020, 1, 1));
        // 1461 days, four years of 365.25 days
        let dep = asset.depreciation(date(2024, 1, 1));
        assert_eq!(dep.annual_depreciation, 4_000.0);
        assert!((dep.accumulated_depreciation - 16_000.0).abs() < 1e-6);
        assert!((dep.book_value - 34_000.0).abs() < 1e-6);
        assert!((dep.remaining_life_years - 6.0).abs() < 1e-6);
    }

    #[test]
    fn depreciation_stops_at_residual_value() {
        let dep = tractor(date(2000, 1, 1)).depreciation(date(2026, 1, 1));
        assert_eq!(dep.accumulated_depreciation, 40_000.0);
        assert_eq!(dep.book_value, 10_000.0);
        assert_eq!(dep.remaining_life_years, 0.0);
    }

    #[test]
    fn future_purchase_has_no_depreciation() {
        let dep = tractor(date(2030, 1, 1)).depreciation(date(2026, 1, 1));
        assert_eq!(dep.accumulated_depreciation, 0.0);
        assert_eq!(dep.book_value, 50_000.0);
        assert_eq!(dep.remaining_life_years, 10.0);
    }
}
