use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub farm_id: Uuid, // Foreign key to Farm
    pub title: String,
    pub zone: Option<String>, // Zone label, matched against map zone names
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub priority: TaskPriority,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub owner: Option<String>, // Person responsible, free text
    pub completed_at: Option<DateTime<Utc>>, // Set on entering done, cleared on leaving it
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Done
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date.is_some_and(|due| due < today)
    }

    /// Whether this task is attached to the zone called `label`.
    pub fn in_zone(&self, label: &str) -> bool {
        let key = zone_key(label);
        self.zone.as_deref().is_some_and(|zone| zone_key(zone) == key)
    }
}

/// Comparison key for zone labels: trimmed, Unicode lower case.
pub fn zone_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Body of both create and full update requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub zone: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: Option<String>,
    pub priority: Option<TaskPriority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub owner: Option<String>,
}

pub type UpdateTask = CreateTask;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub zone: Option<String>,
}

const TASK_COLUMNS: &str = "id, farm_id, title, zone, task_type, priority, start_date, due_date, status, owner, completed_at, created_at, updated_at";

impl Task {
    pub async fn find_by_farm_id(
        pool: &SqlitePool,
        farm_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS}
             FROM tasks
             WHERE farm_id = $1
               AND ($2 IS NULL OR status = $2)
             ORDER BY due_date IS NULL, due_date ASC, created_at ASC"
        ))
        .bind(farm_id)
        .bind(filter.status)
        .fetch_all(pool)
        .await?;
        // SQLite's lower() only folds ASCII, so the zone match happens here.
        if let Some(zone) = filter.zone.as_deref() {
            tasks.retain(|task| task.in_zone(zone));
        }
        Ok(tasks)
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND farm_id = $2"
        ))
        .bind(id)
        .bind(farm_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        farm_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let priority = data.priority.unwrap_or_default();
        let status = data.status.unwrap_or_default();
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, farm_id, title, zone, task_type, priority, start_date, due_date, status, owner, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     CASE WHEN $9 = 'done' THEN datetime('now', 'subsec') END)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(farm_id)
        .bind(&data.title)
        .bind(&data.zone)
        .bind(&data.task_type)
        .bind(priority)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(status)
        .bind(&data.owner)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let priority = data.priority.unwrap_or_default();
        let status = data.status.unwrap_or_default();
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $3, zone = $4, task_type = $5, priority = $6, start_date = $7,
                 due_date = $8, status = $9, owner = $10,
                 completed_at = CASE WHEN $9 = 'done'
                                     THEN COALESCE(completed_at, datetime('now', 'subsec'))
                                END,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND farm_id = $2
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(farm_id)
        .bind(&data.title)
        .bind(&data.zone)
        .bind(&data.task_type)
        .bind(priority)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(status)
        .bind(&data.owner)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET status = $3,
                 completed_at = CASE WHEN $3 = 'done'
                                     THEN COALESCE(completed_at, datetime('now', 'subsec'))
                                END,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND farm_id = $2
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(farm_id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, farm_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND farm_id = $2")
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
    use crate::{
        DBService,
        models::{
            farm::{CreateFarm, Farm},
            user::{CreateUser, User},
        },
    };

    async fn seed_farm(pool: &SqlitePool) -> Uuid {
        let user_id = Uuid::new_v4();
        User::create(
            pool,
            &CreateUser {
                email: "owner@example.com".to_string(),
                name: "Owner".to_string(),
                password_hash: "hash".to_string(),
            },
            user_id,
        )
        .await
        .unwrap();
        let farm = CreateFarm {
            name: "Finca".to_string(),
            view: None,
            preferred_center: None,
        };
        Farm::create(pool, user_id, &farm, Uuid::new_v4()).await.unwrap().id
    }

    fn task(title: &str, zone: Option<&str>, due: Option<NaiveDate>) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            zone: zone.map(str::to_string),
            task_type: Some("riego".to_string()),
            priority: None,
            start_date: None,
            due_date: due,
            status: None,
            owner: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        let created = Task::create(&db.pool, farm_id, &task("Regar", None, None), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(created.priority, TaskPriority::Medium);
        assert_eq!(created.task_type.as_deref(), Some("riego"));
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_due_date() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        for (title, zone, due) in [
            ("sin fecha", Some("Norte"), None),
            ("tarde", Some("norte "), Some(date(2026, 5, 10))),
            ("pronto", Some("Sur"), Some(date(2026, 5, 1))),
        ] {
            Task::create(&db.pool, farm_id, &task(title, zone, due), Uuid::new_v4())
                .await
                .unwrap();
        }

        let all = Task::find_by_farm_id(&db.pool, farm_id, &TaskFilter::default())
            .await
            .unwrap();
        let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["pronto", "tarde", "sin fecha"]);

        let filter = TaskFilter {
            status: None,
            zone: Some("NORTE".to_string()),
        };
        let north = Task::find_by_farm_id(&db.pool, farm_id, &filter).await.unwrap();
        assert_eq!(north.len(), 2);

        let done = TaskFilter {
            status: Some(TaskStatus::Done),
            zone: None,
        };
        assert!(Task::find_by_farm_id(&db.pool, farm_id, &done).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_update_is_scoped_to_farm() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        let created = Task::create(&db.pool, farm_id, &task("Podar", None, None), Uuid::new_v4())
            .await
            .unwrap();
        let other_farm = Uuid::new_v4();
        assert!(
            Task::update_status(&db.pool, created.id, other_farm, TaskStatus::Done)
                .await
                .unwrap()
                .is_none()
        );
        let updated = Task::update_status(&db.pool, created.id, farm_id, TaskStatus::Done)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
    }

    #[test]
    fn overdue_requires_open_task_past_due() {
        let today = date(2026, 6, 1);
        let mut t = Task {
            id: Uuid::new_v4(),
            farm_id: Uuid::new_v4(),
            title: "Abonar".to_string(),
            zone: Some("Huerta".to_string()),
            task_type: None,
            priority: TaskPriority::High,
            start_date: None,
            due_date: Some(date(2026, 5, 30)),
            status: TaskStatus::Pending,
            owner: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(t.is_overdue(today));
        assert!(t.in_zone(" huerta"));
        t.zone = Some("área norte".to_string());
        assert!(t.in_zone("Área Norte "));
        assert!(!t.in_zone("Área Sur"));
        t.status = TaskStatus::Done;
        assert!(!t.is_overdue(today));
        t.status = TaskStatus::InProgress;
        t.due_date = Some(today);
        assert!(!t.is_overdue(today));
    }

    #[tokio::test]
    async fn zone_filter_folds_accented_labels() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        for (title, zone) in [("podar", "área norte"), ("regar", "Área Norte "), ("abonar", "Área Sur")] {
            Task::create(&db.pool, farm_id, &task(title, Some(zone), None), Uuid::new_v4())
                .await
                .unwrap();
        }
        let filter = TaskFilter {
            status: None,
            zone: Some("ÁREA NORTE".to_string()),
        };
        let north = Task::find_by_farm_id(&db.pool, farm_id, &filter).await.unwrap();
        let mut titles: Vec<_> = north.iter().map(|t| t.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, ["podar", "regar"]);
    }

    #[tokio::test]
    async fn completed_at_tracks_the_done_transition() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        let created = Task::create(&db.pool, farm_id, &task("Cosechar", None, None), Uuid::new_v4())
            .await
            .unwrap();
        assert!(created.completed_at.is_none());

        let done = Task::update_status(&db.pool, created.id, farm_id, TaskStatus::Done)
            .await
            .unwrap()
            .unwrap();
        let completed_at = done.completed_at.expect("completed_at set when done");

        // Editing a finished task keeps its completion time.
        let mut edit = task("Cosechar maíz", None, None);
        edit.status = Some(TaskStatus::Done);
        let edited = Task::update(&db.pool, created.id, farm_id, &edit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.title, "Cosechar maíz");
        assert_eq!(edited.completed_at, Some(completed_at));
        let again = Task::update_status(&db.pool, created.id, farm_id, TaskStatus::Done)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.completed_at, Some(completed_at));

        // Reopening clears it.
        let reopened = Task::update(&db.pool, created.id, farm_id, &task("Cosechar maíz", None, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn create_as_done_sets_completed_at() {
        let db = DBService::new_in_memory().await.unwrap();
        let farm_id = seed_farm(&db.pool).await;
        let mut data = task("Sembrar", None, None);
        data.status = Some(TaskStatus::Done);
        let created = Task::create(&db.pool, farm_id, &data, Uuid::new_v4()).await.unwrap();
        assert!(created.completed_at.is_some());
    }
}
