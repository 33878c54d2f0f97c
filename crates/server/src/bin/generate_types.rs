use std::{env, fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    // Dependency order is not required by TypeScript; keep related types together.
    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        server::routes::health::HealthStatus::decl(),
        db::models::user::User::decl(),
        services::services::auth::RegisterRequest::decl(),
        services::services::auth::LoginRequest::decl(),
        services::services::auth::AuthResponse::decl(),
        db::models::farm::Farm::decl(),
        db::models::farm::CreateFarm::decl(),
        db::models::map_feature::MapFeatureKind::decl(),
        db::models::map_feature::MapFeature::decl(),
        db::models::map_feature::CreateMapFeature::decl(),
        db::models::map_feature::FarmMap::decl(),
        db::models::map_feature::ReplaceFarmMap::decl(),
        db::models::task::TaskStatus::decl(),
        db::models::task::TaskPriority::decl(),
        db::models::task::Task::decl(),
        db::models::task::CreateTask::decl(),
        db::models::task::UpdateTaskStatus::decl(),
        db::models::task::TaskFilter::decl(),
        db::models::finance_movement::MovementType::decl(),
        db::models::finance_movement::FinanceMovement::decl(),
        db::models::finance_movement::CreateFinanceMovement::decl(),
        db::models::finance_movement::MovementFilter::decl(),
        db::models::asset::Asset::decl(),
        db::models::asset::Depreciation::decl(),
        db::models::asset::AssetWithDepreciation::decl(),
        db::models::asset::CreateAsset::decl(),
        services::services::finance_summary::CategoryTotal::decl(),
        services::services::finance_summary::MonthTotal::decl(),
        services::services::finance_summary::FinanceSummary::decl(),
        services::services::finance_insights::AnomalyKind::decl(),
        services::services::finance_insights::Anomaly::decl(),
        services::services::finance_insights::FinanceSuggestionKind::decl(),
        services::services::finance_insights::FinanceSuggestion::decl(),
        services::services::finance_insights::HealthLabel::decl(),
        services::services::finance_insights::HealthFactor::decl(),
        services::services::finance_insights::FinancialHealth::decl(),
        services::services::finance_insights::FinanceInsights::decl(),
        services::services::finance_insights::InsightsQuery::decl(),
        services::services::task_suggestions::TaskSuggestionKind::decl(),
        services::services::task_suggestions::TaskSuggestion::decl(),
        services::services::zone_report::StatusCounts::decl(),
        services::services::zone_report::ZoneReport::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            let trimmed = decl.trim_start();
            if trimmed.starts_with("export") {
                trimmed.to_string()
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = Path::new("shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("✅ shared/types.ts is up to date.");
            std::process::exit(0);
        }
        eprintln!("❌ shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
        std::process::exit(1);
    }

    if let Err(err) = fs::create_dir_all(shared_path).and_then(|_| fs::write(&types_path, generated)) {
        eprintln!("Failed to write {}: {err}", types_path.display());
        std::process::exit(1);
    }
    println!("✅ TypeScript types generated in shared/types.ts");
}
