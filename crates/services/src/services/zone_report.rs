use chrono::NaiveDate;
use db::models::{
    map_feature::{MapFeature, MapFeatureKind},
    task::{Task, TaskFilter, TaskStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ZoneReport {
    pub zone: MapFeature,
    pub label: Option<String>,
    pub tasks: Vec<Task>,
    pub counts: StatusCounts,
    pub overdue: usize,
    pub next_due: Option<Task>,
}

/// `None` when the zone does not exist in this farm.
pub async fn load_zone_report(
    pool: &SqlitePool,
    farm_id: Uuid,
    zone_id: Uuid,
    today: NaiveDate,
) -> Result<Option<ZoneReport>, sqlx::Error> {
    let Some(zone) = MapFeature::find_by_id(pool, MapFeatureKind::Zone, zone_id, farm_id).await?
    else {
        return Ok(None);
    };
    let tasks = Task::find_by_farm_id(pool, farm_id, &TaskFilter::default()).await?;
    Ok(Some(build_zone_report(zone, tasks, today)))
}

pub fn build_zone_report(zone: MapFeature, tasks: Vec<Task>, today: NaiveDate) -> ZoneReport {
    let label = zone.label();
    // An unnamed zone cannot be referenced by tasks
    let tasks: Vec<Task> = match &label {
        Some(label) => tasks.into_iter().filter(|t| t.in_zone(label)).collect(),
        None => Vec::new(),
    };

    let mut counts = StatusCounts::default();
    for task in &tasks {
        match task.status {
            TaskStatus::Pending => counts.pending += 1,
            TaskStatus::InProgress => counts.in_progress += 1,
            TaskStatus::Done => counts.done += 1,
        }
    }
    let overdue = tasks.iter().filter(|t| t.is_overdue(today)).count();
    let next_due = tasks
        .iter()
        .filter(|t| t.is_open() && t.due_date.is_some_and(|due| due >= today))
        .min_by_key(|t| t.due_date)
        .cloned();

    ZoneReport {
        zone,
        label,
        tasks,
        counts,
        overdue,
        next_due,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::models::task::TaskPriority;
    use serde_json::json;
    use sqlx::types::Json;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn zone(data: serde_json::Value) -> MapFeature {
        MapFeature {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            data: Json(data),
            components: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(title: &str, zone: &str, status: TaskStatus, due: Option<&str>) -> Task {
        Task {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            title: title.to_string(),
            zone: Some(zone.to_string()),
            task_type: None,
            priority: TaskPriority::Medium,
            start_date: None,
            due_date: due.map(date),
            status,
            owner: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn report_counts_tasks_in_zone() {
        let tasks = vec![
            task("a", "Olivar", TaskStatus::Pending, Some("2026-06-01")),
            task("b", "olivar", TaskStatus::InProgress, Some("2026-06-20")),
            task("c", "Olivar", TaskStatus::Pending, Some("2026-06-18")),
            task("d", "Olivar", TaskStatus::Done, Some("2026-05-01")),
            task("e", "Huerta", TaskStatus::Pending, None),
        ];
        let report = build_zone_report(
            zone(json!({"properties": {"name": "Olivar"}})),
            tasks,
            date("2026-06-15"),
        );
        assert_eq!(report.label.as_deref(), Some("Olivar"));
        assert_eq!(report.tasks.len(), 4);
        assert_eq!(
            report.counts,
            StatusCounts {
                pending: 2,
                in_progress: 1,
                done: 1
            }
        );
        assert_eq!(report.overdue, 1);
        assert_eq!(report.next_due.map(|t| t.title), Some("c".to_string()));
    }

    #[test]
    fn unnamed_zone_has_no_tasks() {
        let tasks = vec![task("a", "Olivar", TaskStatus::Pending, None)];
        let report = build_zone_report(zone(json!({"coordinates": []})), tasks, date("2026-06-15"));
        assert!(report.label.is_none());
        assert!(report.tasks.is_empty());
        assert!(report.next_due.is_none());
    }

    #[test]
    fn accented_labels_match_across_case() {
        let tasks = vec![
            task("a", "área norte", TaskStatus::Pending, Some("2026-06-20")),
            task("b", " ÁREA NORTE", TaskStatus::Done, None),
            task("c", "Área Sur", TaskStatus::Pending, None),
        ];
        let report = build_zone_report(zone(json!({"name": "Área Norte"})), tasks, date("2026-06-15"));
        let titles: Vec<_> = report.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
        assert_eq!(report.next_due.map(|t| t.title), Some("a".to_string()));
    }
}
