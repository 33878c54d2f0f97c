use std::collections::{BTreeMap, HashMap};

use db::models::finance_movement::{FinanceMovement, MovementType, category_key};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Categories differing only in case or surrounding spaces are merged under
/// the first spelling seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CategoryTotal {
    pub category: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub by_category: Vec<CategoryTotal>,
    pub by_month: Vec<MonthTotal>,
}

pub fn summarize(movements: &[FinanceMovement]) -> FinanceSummary {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut categories: HashMap<(String, MovementType), (String, f64)> = HashMap::new();
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for movement in movements {
        let month = months
            .entry(movement.date.format("%Y-%m").to_string())
            .or_default();
        match movement.movement_type {
            MovementType::Income => {
                total_income += movement.amount;
                month.0 += movement.amount;
            }
            MovementType::Expense => {
                total_expense += movement.amount;
                month.1 += movement.amount;
            }
        }
        categories
            .entry((category_key(&movement.category), movement.movement_type))
            .or_insert_with(|| (movement.category.trim().to_string(), 0.0))
            .1 += movement.amount;
    }

    let mut by_category: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|((_, movement_type), (category, total))| CategoryTotal {
            category,
            movement_type,
            total,
        })
        .collect();
    by_category.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    let by_month = months
        .into_iter()
        .map(|(month, (income, expense))| MonthTotal {
            month,
            income,
            expense,
            balance: income - expense,
        })
        .collect();

    FinanceSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        by_category,
        by_month,
    }
}
