//! Financial anomaly detection, finance suggestions and the financial
//! health score. Everything is recomputed from the farm's movements and
//! assets on each request.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use db::models::{
    asset::Asset,
    finance_movement::{FinanceMovement, MovementFilter, category_key},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

use super::validation::ValidationError;

pub const DEFAULT_WINDOW_DAYS: i64 = 90;
pub const MAX_WINDOW_DAYS: i64 = 730;

const OUTLIER_FACTOR: f64 = 3.0;
const OUTLIER_MIN_SAMPLES: usize = 3;
const SPIKE_FACTOR: f64 = 1.3;
const HIGH_EXPENSE_RATIO: f64 = 0.8;
const CONCENTRATION_SHARE: f64 = 0.5;
const INVOICE_REQUIRED_FROM: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnomalyKind {
    OutlierExpense,
    ExpenseSpike,
    DuplicateInvoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub message: String,
    pub movement_ids: Vec<Uuid>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinanceSuggestionKind {
    ReduceExpenses,
    CategoryConcentration,
    MissingInvoice,
    PlanAssetReplacement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FinanceSuggestion {
    pub kind: FinanceSuggestionKind,
    pub message: String,
    pub category: Option<String>,
    pub movement_ids: Vec<Uuid>,
    pub asset_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthLabel {
    Good,
    Fair,
    Poor,
}

impl HealthLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Self::Good,
            50..=74 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct HealthFactor {
    pub code: String,
    /// Points taken off the score (zero or negative).
    pub impact: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FinancialHealth {
    pub score: u8,
    pub label: HealthLabel,
    pub factors: Vec<HealthFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FinanceInsights {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    /// Expense over income; absent when there is no income.
    pub expense_ratio: Option<f64>,
    pub health: FinancialHealth,
    pub anomalies: Vec<Anomaly>,
    pub suggestions: Vec<FinanceSuggestion>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct InsightsQuery {
    pub days: Option<i64>,
}

impl InsightsQuery {
    pub fn window_days(&self) -> Result<i64, ValidationError> {
        match self.days {
            None => Ok(DEFAULT_WINDOW_DAYS),
            Some(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => Ok(days),
            Some(_) => Err(ValidationError::new(
                "days",
                format!("must be between 1 and {MAX_WINDOW_DAYS}"),
            )),
        }
    }
}

pub async fn load_finance_insights(
    pool: &SqlitePool,
    farm_id: Uuid,
    today: NaiveDate,
    window_days: i64,
) -> Result<FinanceInsights, sqlx::Error> {
    // The spike rule looks back three whole months, which can reach past
    // the window.
    let lookback_start = month_start(today)
        .checked_sub_months(Months::new(3))
        .unwrap_or(today);
    let window_start = today - Duration::days(window_days - 1);
    let filter = MovementFilter::between(lookback_start.min(window_start), today);
    let movements = FinanceMovement::find_by_farm_id(pool, farm_id, &filter).await?;
    let assets = Asset::find_by_farm_id(pool, farm_id).await?;
    Ok(analyze(&movements, &assets, today, window_days))
}

/// Run every rule over `movements` and `assets`. `window_days` counts back
/// from `today` inclusive.
pub fn analyze(
    movements: &[FinanceMovement],
    assets: &[Asset],
    today: NaiveDate,
    window_days: i64,
) -> FinanceInsights {
    let window_start = today - Duration::days(window_days.max(1) - 1);
    let window: Vec<&FinanceMovement> = movements
        .iter()
        .filter(|m| m.date >= window_start && m.date <= today)
        .collect();

    let income: f64 = window.iter().filter(|m| !m.is_expense()).map(|m| m.amount).sum();
    let expense: f64 = window.iter().filter(|m| m.is_expense()).map(|m| m.amount).sum();
    let expense_ratio = (income > 0.0).then(|| expense / income);

    let mut anomalies = outlier_expenses(&window);
    // An empty window reports no_data, so nothing is flagged either.
    if !window.is_empty() {
        anomalies.extend(expense_spike(movements, today));
    }
    anomalies.extend(duplicate_invoices(&window));

    let concentration = category_concentration(&window, expense);
    let mut suggestions = Vec::new();
    if expense > 0.0 && expense_ratio.is_none_or(|r| r > HIGH_EXPENSE_RATIO) {
        suggestions.push(FinanceSuggestion {
            kind: FinanceSuggestionKind::ReduceExpenses,
            message: match expense_ratio {
                Some(ratio) => format!(
                    "Expenses are {:.0}% of income in the last {window_days} days",
                    ratio * 100.0
                ),
                None => format!("There are expenses but no income in the last {window_days} days"),
            },
            category: None,
            movement_ids: Vec::new(),
            asset_id: None,
        });
    }
    if let Some((category, share)) = &concentration {
        suggestions.push(FinanceSuggestion {
            kind: FinanceSuggestionKind::CategoryConcentration,
            message: format!("{category} accounts for {:.0}% of expenses", share * 100.0),
            category: Some(category.clone()),
            movement_ids: Vec::new(),
            asset_id: None,
        });
    }
    let uninvoiced: Vec<Uuid> = window
        .iter()
        .filter(|m| m.is_expense() && m.amount >= INVOICE_REQUIRED_FROM && !m.has_invoice())
        .map(|m| m.id)
        .collect();
    if !uninvoiced.is_empty() {
        suggestions.push(FinanceSuggestion {
            kind: FinanceSuggestionKind::MissingInvoice,
            message: format!(
                "{} expenses of {INVOICE_REQUIRED_FROM:.0} or more have no invoice number",
                uninvoiced.len()
            ),
            category: None,
            movement_ids: uninvoiced,
            asset_id: None,
        });
    }
    for asset in assets {
        let remaining = asset.depreciation(today).remaining_life_years;
        if remaining < 1.0 {
            suggestions.push(FinanceSuggestion {
                kind: FinanceSuggestionKind::PlanAssetReplacement,
                message: format!(
                    "{} has {:.1} years of useful life left",
                    asset.name, remaining
                ),
                category: Some(asset.category.clone()),
                movement_ids: Vec::new(),
                asset_id: Some(asset.id),
            });
        }
    }

    let health = if window.is_empty() {
        FinancialHealth {
            score: 100,
            label: HealthLabel::Good,
            factors: vec![HealthFactor {
                code: "no_data".to_string(),
                impact: 0,
            }],
        }
    } else {
        let any_uninvoiced = window.iter().any(|m| m.is_expense() && !m.has_invoice());
        health_score(
            income,
            expense,
            anomalies.len(),
            concentration.is_some(),
            any_uninvoiced,
        )
    };

    FinanceInsights {
        window_start,
        window_end: today,
        income,
        expense,
        balance: income - expense,
        expense_ratio,
        health,
        anomalies,
        suggestions,
    }
}

fn health_score(
    income: f64,
    expense: f64,
    anomaly_count: usize,
    concentrated: bool,
    any_uninvoiced: bool,
) -> FinancialHealth {
    let mut factors = Vec::new();
    let mut deduct = |code: &str, impact: i32| {
        factors.push(HealthFactor {
            code: code.to_string(),
            impact: -impact,
        })
    };

    if expense > 0.0 && income <= 0.0 {
        deduct("expenses_without_income", 40);
    } else if income > 0.0 && expense / income > 1.0 {
        deduct("expense_ratio_above_income", 40);
    } else if income > 0.0 && expense / income > HIGH_EXPENSE_RATIO {
        deduct("high_expense_ratio", 20);
    }
    if income - expense < 0.0 {
        deduct("negative_balance", 15);
    }
    if anomaly_count > 0 {
        let penalty = (anomaly_count as i32).saturating_mul(5).min(20);
        deduct("anomalies", penalty);
    }
    if concentrated {
        deduct("category_concentration", 10);
    }
    if any_uninvoiced {
        deduct("missing_invoices", 5);
    }

    let total: i32 = factors.iter().map(|f| f.impact).sum();
    let score = (100 + total).clamp(0, 100) as u8;
    FinancialHealth {
        score,
        label: HealthLabel::from_score(score),
        factors,
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn outlier_expenses(window: &[&FinanceMovement]) -> Vec<Anomaly> {
    let mut by_category: HashMap<String, Vec<&FinanceMovement>> = HashMap::new();
    for movement in window.iter().copied().filter(|m| m.is_expense()) {
        by_category
            .entry(category_key(&movement.category))
            .or_default()
            .push(movement);
    }

    let mut anomalies = Vec::new();
    for group in by_category.values() {
        if group.len() < OUTLIER_MIN_SAMPLES {
            continue;
        }
        let mut amounts: Vec<f64> = group.iter().map(|m| m.amount).collect();
        let median = median(&mut amounts);
        for movement in group {
            if movement.amount > OUTLIER_FACTOR * median {
                anomalies.push(Anomaly {
                    kind: AnomalyKind::OutlierExpense,
                    message: format!(
                        "{} ({:.2}) is more than {OUTLIER_FACTOR:.0}x the usual {} expense ({:.2})",
                        movement.concept,
                        movement.amount,
                        movement.category.trim(),
                        median
                    ),
                    movement_ids: vec![movement.id],
                    amount: Some(movement.amount),
                });
            }
        }
    }
    // Stable order for clients regardless of hash iteration
    anomalies.sort_by(|a, b| {
        b.amount
            .unwrap_or_default()
            .total_cmp(&a.amount.unwrap_or_default())
            .then_with(|| a.movement_ids.cmp(&b.movement_ids))
    });
    anomalies
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn expense_spike(movements: &[FinanceMovement], today: NaiveDate) -> Option<Anomaly> {
    let current_start = month_start(today);
    let previous_start = current_start.checked_sub_months(Months::new(3))?;

    let mut current = 0.0;
    let mut previous = 0.0;
    for movement in movements.iter().filter(|m| m.is_expense() && m.date <= today) {
        if movement.date >= current_start {
            current += movement.amount;
        } else if movement.date >= previous_start {
            previous += movement.amount;
        }
    }
    let average = previous / 3.0;
    if average <= 0.0 || current <= SPIKE_FACTOR * average {
        return None;
    }
    Some(Anomaly {
        kind: AnomalyKind::ExpenseSpike,
        message: format!(
            "Expenses this month ({current:.2}) exceed the three-month average ({average:.2}) by {:.0}%",
            (current / average - 1.0) * 100.0
        ),
        movement_ids: Vec::new(),
        amount: Some(current),
    })
}

fn duplicate_invoices(window: &[&FinanceMovement]) -> Vec<Anomaly> {
    let mut by_invoice: HashMap<String, Vec<&FinanceMovement>> = HashMap::new();
    for movement in window.iter().copied() {
        if let Some(invoice) = movement.invoice_number.as_deref() {
            let invoice = invoice.trim();
            if !invoice.is_empty() {
                by_invoice
                    .entry(invoice.to_lowercase())
                    .or_default()
                    .push(movement);
            }
        }
    }

    let mut duplicates: Vec<(String, Vec<&FinanceMovement>)> = by_invoice
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .collect();
    duplicates.sort_by(|a, b| a.0.cmp(&b.0));
    duplicates
        .into_iter()
        .map(|(invoice, group)| Anomaly {
            kind: AnomalyKind::DuplicateInvoice,
            message: format!("Invoice {invoice} is used by {} movements", group.len()),
            movement_ids: group.iter().map(|m| m.id).collect(),
            amount: Some(group.iter().map(|m| m.amount).sum()),
        })
        .collect()
}

/// The dominant expense category and its share, when it exceeds half of
/// all expenses.
fn category_concentration(window: &[&FinanceMovement], expense: f64) -> Option<(String, f64)> {
    let expenses: Vec<&&FinanceMovement> = window.iter().filter(|m| m.is_expense()).collect();
    if expenses.len() < 2 || expense <= 0.0 {
        return None;
    }
    let mut totals: HashMap<String, (String, f64)> = HashMap::new();
    for movement in expenses {
        let entry = totals
            .entry(category_key(&movement.category))
            .or_insert_with(|| (movement.category.trim().to_string(), 0.0));
        entry.1 += movement.amount;
    }
    totals
        .into_values()
        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(category, total)| (category, total / expense))
        .filter(|(_, share)| *share > CONCENTRATION_SHARE)
}
