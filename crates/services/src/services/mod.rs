pub mod auth;
pub mod config;
pub mod farm_access;
pub mod finance_insights;
pub mod finance_summary;
pub mod task_suggestions;
pub mod validation;
pub mod zone_report;
