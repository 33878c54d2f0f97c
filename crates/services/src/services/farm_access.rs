//! Row-level ownership: every farm-scoped request resolves its farm through
//! here before touching child rows.

use db::models::farm::Farm;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Also returned when the farm exists but belongs to someone else.
    #[error("farm not found")]
    FarmNotFound,
}

pub struct FarmAccess;

impl FarmAccess {
    pub async fn require(
        pool: &SqlitePool,
        user_id: Uuid,
        farm_id: Uuid,
    ) -> Result<Farm, AccessError> {
        match Farm::find_for_user(pool, farm_id, user_id).await? {
            Some(farm) => Ok(farm),
            None => {
                debug!(farm_id = %farm_id, user_id = %user_id, "Farm access denied");
                Err(AccessError::FarmNotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{
            farm::CreateFarm,
            user::{CreateUser, User},
        },
    };

    use super::*;

    async fn seed_user(pool: &SqlitePool, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        let data = CreateUser {
            email: email.to_string(),
            name: "User".to_string(),
            password_hash: "hash".to_string(),
        };
        User::create(pool, &data, id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn only_the_owner_gets_the_farm() {
        let db = DBService::new_in_memory().await.unwrap();
        let owner = seed_user(&db.pool, "owner@example.com").await;
        let stranger = seed_user(&db.pool, "stranger@example.com").await;
        let farm = Farm::create(
            &db.pool,
            owner,
            &CreateFarm {
                name: "Finca".to_string(),
                view: None,
                preferred_center: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(FarmAccess::require(&db.pool, owner, farm.id).await.unwrap().id, farm.id);
        assert!(matches!(
            FarmAccess::require(&db.pool, stranger, farm.id).await,
            Err(AccessError::FarmNotFound)
        ));
        assert!(matches!(
            FarmAccess::require(&db.pool, owner, Uuid::new_v4()).await,
            Err(AccessError::FarmNotFound)
        ));
    }
}
