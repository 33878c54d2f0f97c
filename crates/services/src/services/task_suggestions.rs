//! Rule-based task suggestions derived from a farm's tasks, map zones,
//! assets and recent expenses.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};
use db::models::{
    asset::Asset,
    finance_movement::{FinanceMovement, MovementFilter, MovementType},
    map_feature::{MapFeature, MapFeatureKind},
    task::{Task, TaskFilter, TaskPriority, TaskStatus, zone_key},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

const ZONE_OVERLOAD_OPEN_TASKS: usize = 5;
const RECENT_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskSuggestionKind {
    Overdue,
    StartPending,
    InspectZone,
    ZoneOverload,
    AssetMaintenance,
    RecordExpenses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TaskSuggestion {
    pub kind: TaskSuggestionKind,
    pub title: String,
    pub reason: String,
    pub priority: TaskPriority,
    pub zone: Option<String>,
    pub task_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
}

impl TaskSuggestion {
    fn new(kind: TaskSuggestionKind, priority: TaskPriority, title: String, reason: String) -> Self {
        Self {
            kind,
            title,
            reason,
            priority,
            zone: None,
            task_id: None,
            asset_id: None,
        }
    }

    fn for_task(mut self, task: &Task) -> Self {
        self.task_id = Some(task.id);
        self.zone = task.zone.clone();
        self
    }
}

pub async fn load_task_suggestions(
    pool: &SqlitePool,
    farm_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<TaskSuggestion>, sqlx::Error> {
    let tasks = Task::find_by_farm_id(pool, farm_id, &TaskFilter::default()).await?;
    let zones = MapFeature::find_by_farm_id(pool, MapFeatureKind::Zone, farm_id).await?;
    let assets = Asset::find_by_farm_id(pool, farm_id).await?;
    let recent = MovementFilter {
        movement_type: Some(MovementType::Expense),
        ..MovementFilter::between(recent_start(today), today)
    };
    let expenses = FinanceMovement::find_by_farm_id(pool, farm_id, &recent).await?;
    Ok(suggest(&tasks, &zones, &assets, &expenses, today))
}

fn recent_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(RECENT_DAYS - 1)
}

/// Apply the rules in their fixed order.
pub fn suggest(
    tasks: &[Task],
    zones: &[MapFeature],
    assets: &[Asset],
    movements: &[FinanceMovement],
    today: NaiveDate,
) -> Vec<TaskSuggestion> {
    let mut suggestions = Vec::new();
    let open: Vec<&Task> = tasks.iter().filter(|t| t.is_open()).collect();

    for task in open.iter().filter(|t| t.is_overdue(today)) {
        let due = task.due_date.unwrap_or(today);
        suggestions.push(
            TaskSuggestion::new(
                TaskSuggestionKind::Overdue,
                TaskPriority::High,
                format!("Reschedule or finish \"{}\"", task.title),
                format!("Due on {due}, {} days ago", (today - due).num_days()),
            )
            .for_task(task),
        );
    }

    for task in open.iter().filter(|t| {
        t.status == TaskStatus::Pending
            && t.priority == TaskPriority::High
            && t.start_date.is_some_and(|start| start <= today)
            && !t.is_overdue(today)
    }) {
        suggestions.push(
            TaskSuggestion::new(
                TaskSuggestionKind::StartPending,
                TaskPriority::High,
                format!("Start \"{}\"", task.title),
                "High-priority task whose start date has arrived is still pending".to_string(),
            )
            .for_task(task),
        );
    }

    let mut seen_zones = HashSet::new();
    for label in zones.iter().filter_map(MapFeature::label) {
        if !seen_zones.insert(zone_key(&label)) {
            continue;
        }
        if !open.iter().any(|t| t.in_zone(&label)) {
            let mut suggestion = TaskSuggestion::new(
                TaskSuggestionKind::InspectZone,
                TaskPriority::Low,
                format!("Inspect zone {label}"),
                "No open tasks are planned for this zone".to_string(),
            );
            suggestion.zone = Some(label);
            suggestions.push(suggestion);
        }
    }

    let mut open_by_zone: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for zone in open.iter().filter_map(|t| t.zone.as_deref()) {
        let zone = zone.trim();
        if zone.is_empty() {
            continue;
        }
        open_by_zone
            .entry(zone_key(zone))
            .or_insert_with(|| (zone.to_string(), 0))
            .1 += 1;
    }
    for (label, count) in open_by_zone.into_values() {
        if count > ZONE_OVERLOAD_OPEN_TASKS {
            let mut suggestion = TaskSuggestion::new(
                TaskSuggestionKind::ZoneOverload,
                TaskPriority::Medium,
                format!("Redistribute work in zone {label}"),
                format!("{count} open tasks are assigned to this zone"),
            );
            suggestion.zone = Some(label);
            suggestions.push(suggestion);
        }
    }

    for asset in assets {
        let remaining = asset.depreciation(today).remaining_life_years;
        if remaining < 1.0 {
            let mut suggestion = TaskSuggestion::new(
                TaskSuggestionKind::AssetMaintenance,
                TaskPriority::Medium,
                format!("Service or replace {}", asset.name),
                format!("{remaining:.1} years of useful life left"),
            );
            suggestion.asset_id = Some(asset.id);
            suggestions.push(suggestion);
        }
    }

    let window_start = recent_start(today);
    let in_window = |date: NaiveDate| date >= window_start && date <= today;
    let recently_done = tasks
        .iter()
        .filter(|t| {
            t.status == TaskStatus::Done
                && t.completed_at.is_some_and(|at| in_window(at.date_naive()))
        })
        .count();
    let recent_expense = movements
        .iter()
        .any(|m| m.is_expense() && in_window(m.date));
    if recently_done > 0 && !recent_expense {
        suggestions.push(TaskSuggestion::new(
            TaskSuggestionKind::RecordExpenses,
            TaskPriority::Low,
            "Record the costs of recent work".to_string(),
            format!(
                "{recently_done} tasks were completed in the last {RECENT_DAYS} days but no expense was recorded"
            ),
        ));
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlx::types::Json;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const TODAY: &str = "2026-06-15";

    fn task(title: &str, zone: Option<&str>) -> Task {
        Task {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            title: title.to_string(),
            zone: zone.map(str::to_string),
            task_type: None,
            priority: TaskPriority::Medium,
            start_date: None,
            due_date: None,
            status: TaskStatus::Pending,
            owner: None,
            completed_at: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap(),
        }
    }

    fn zone(name: &str) -> MapFeature {
        MapFeature {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            data: Json(json!({"name": name})),
            components: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn kinds(suggestions: &[TaskSuggestion]) -> Vec<TaskSuggestionKind> {
        suggestions.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn nothing_to_suggest_for_an_empty_farm() {
        assert!(suggest(&[], &[], &[], &[], date(TODAY)).is_empty());
    }

    #[test]
    fn overdue_and_start_pending() {
        let mut late = task("Podar", Some("Olivar"));
        late.due_date = Some(date("2026-06-10"));
        let mut start = task("Sembrar", Some("Huerta"));
        start.priority = TaskPriority::High;
        start.start_date = Some(date("2026-06-15"));
        let mut done_late = task("Vallar", None);
        done_late.due_date = Some(date("2026-06-01"));
        done_late.status = TaskStatus::Done;
        let mut low_start = task("Limpiar", None);
        low_start.start_date = Some(date("2026-06-01"));

        let suggestions = suggest(
            &[late.clone(), start.clone(), done_late, low_start],
            &[],
            &[],
            &[],
            date(TODAY),
        );
        assert_eq!(
            kinds(&suggestions),
            [TaskSuggestionKind::Overdue, TaskSuggestionKind::StartPending]
        );
        assert_eq!(suggestions[0].task_id, Some(late.id));
        assert_eq!(suggestions[0].zone.as_deref(), Some("Olivar"));
        assert_eq!(suggestions[0].reason, "Due on 2026-06-10, 5 days ago");
        assert_eq!(suggestions[1].task_id, Some(start.id));
    }

    #[test]
    fn overdue_high_priority_is_not_also_start_pending() {
        let mut t = task("Regar", None);
        t.priority = TaskPriority::High;
        t.start_date = Some(date("2026-06-01"));
        t.due_date = Some(date("2026-06-05"));
        let suggestions = suggest(&[t], &[], &[], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::Overdue]);
    }

    #[test]
    fn idle_zones_get_inspection_suggestions() {
        let zones = [zone("Olivar"), zone("Huerta"), zone("olivar"), zone(" ")];
        let tasks = [task("Regar", Some("huerta "))];
        let suggestions = suggest(&tasks, &zones, &[], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::InspectZone]);
        assert_eq!(suggestions[0].zone.as_deref(), Some("Olivar"));
        assert_eq!(suggestions[0].priority, TaskPriority::Low);
    }

    #[test]
    fn accented_zone_labels_match_regardless_of_case() {
        let zones = [zone("Área Norte"), zone("área norte")];
        let tasks = [task("Podar", Some("ÁREA NORTE "))];
        assert!(suggest(&tasks, &zones, &[], &[], date(TODAY)).is_empty());

        let tasks: Vec<Task> = ["área norte", "Área Norte", "ÁREA NORTE"]
            .iter()
            .cycle()
            .take(6)
            .map(|z| task("Regar", Some(*z)))
            .collect();
        let suggestions = suggest(&tasks, &zones, &[], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::ZoneOverload]);
        assert_eq!(suggestions[0].reason, "6 open tasks are assigned to this zone");
    }

    #[test]
    fn zone_with_more_than_five_open_tasks_is_overloaded() {
        let mut tasks: Vec<Task> = (0..6).map(|i| task(&format!("t{i}"), Some("Viña"))).collect();
        let suggestions = suggest(&tasks, &[zone("Viña")], &[], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::ZoneOverload]);
        assert_eq!(suggestions[0].reason, "6 open tasks are assigned to this zone");

        tasks[0].status = TaskStatus::Done;
        let suggestions = suggest(&tasks, &[zone("Viña")], &[], &[], date(TODAY));
        assert!(suggestions.is_empty());
    }

    #[test]
    fn worn_assets_need_maintenance() {
        let asset = Asset {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            name: "Bomba de riego".to_string(),
            category: "Riego".to_string(),
            purchase_value: 1200.0,
            purchase_date: date("2021-09-01"),
            useful_life_years: 5,
            residual_value: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let suggestions = suggest(&[], &[], &[asset.clone()], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::AssetMaintenance]);
        assert_eq!(suggestions[0].asset_id, Some(asset.id));
    }

    #[test]
    fn finished_work_without_expenses_prompts_recording() {
        let mut done = task("Cosechar", None);
        done.status = TaskStatus::Done;
        done.completed_at = Some(Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap());
        let suggestions = suggest(&[done.clone()], &[], &[], &[], date(TODAY));
        assert_eq!(kinds(&suggestions), [TaskSuggestionKind::RecordExpenses]);

        let expense = FinanceMovement {
            id: Uuid::new_v4(),
            farm_id: Uuid::nil(),
            date: date("2026-06-11"),
            concept: "Jornales".to_string(),
            category: "Personal".to_string(),
            movement_type: MovementType::Expense,
            amount: 300.0,
            note: None,
            invoice_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(suggest(&[done], &[], &[], &[expense], date(TODAY)).is_empty());
    }

    #[test]
    fn editing_an_old_done_task_does_not_count_as_recent_work() {
        let mut done = task("Vallar", None);
        done.status = TaskStatus::Done;
        done.completed_at = Some(Utc.with_ymd_and_hms(2026, 3, 17, 9, 0, 0).unwrap());
        done.updated_at = Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        assert!(suggest(&[done], &[], &[], &[], date(TODAY)).is_empty());
    }
}
