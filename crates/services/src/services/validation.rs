//! Input checks applied before anything reaches the database.

use std::sync::LazyLock;

use db::models::{
    asset::CreateAsset, farm::CreateFarm, finance_movement::CreateFinanceMovement,
    map_feature::CreateMapFeature, task::CreateTask,
};
use regex::Regex;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("valid email regex")
});

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be a positive number"));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    require_text("name", name)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Trims the name in place.
pub fn validate_farm(data: &mut CreateFarm) -> Result<(), ValidationError> {
    data.name = data.name.trim().to_string();
    require_text("name", &data.name)
}

pub fn validate_map_feature(data: &CreateMapFeature) -> Result<(), ValidationError> {
    if !data.data.is_object() {
        return Err(ValidationError::new("data", "must be a JSON object"));
    }
    Ok(())
}

pub fn validate_task(data: &mut CreateTask) -> Result<(), ValidationError> {
    data.title = data.title.trim().to_string();
    require_text("title", &data.title)?;
    data.zone = data
        .zone
        .take()
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty());
    if let (Some(start), Some(due)) = (data.start_date, data.due_date) {
        if start > due {
            return Err(ValidationError::new("due_date", "must not be before start_date"));
        }
    }
    Ok(())
}

pub fn validate_movement(data: &CreateFinanceMovement) -> Result<(), ValidationError> {
    require_text("concept", &data.concept)?;
    require_text("category", &data.category)?;
    require_positive("amount", data.amount)
}

pub fn validate_asset(data: &CreateAsset) -> Result<(), ValidationError> {
    require_text("name", &data.name)?;
    require_text("category", &data.category)?;
    require_positive("purchase_value", data.purchase_value)?;
    if data.useful_life_years <= 0 {
        return Err(ValidationError::new("useful_life_years", "must be greater than zero"));
    }
    if !data.residual_value.is_finite()
        || data.residual_value < 0.0
        || data.residual_value > data.purchase_value
    {
        return Err(ValidationError::new(
            "residual_value",
            "must be between zero and the purchase value",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::finance_movement::MovementType;
    use serde_json::json;

    use super::*;

    fn task(start: Option<NaiveDate>, due: Option<NaiveDate>) -> CreateTask {
        CreateTask {
            title: "  Regar  ".to_string(),
            zone: Some("   ".to_string()),
            task_type: None,
            priority: None,
            start_date: start,
            due_date: due,
            status: None,
            owner: None,
        }
    }

    fn asset(purchase: f64, residual: f64, life: i32) -> CreateAsset {
        CreateAsset {
            name: "Tractor".to_string(),
            category: "Maquinaria".to_string(),
            purchase_value: purchase,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            useful_life_years: life,
            residual_value: residual,
        }
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("ana@example.com", "Ana", "longenough").is_ok());
        assert_eq!(
            validate_registration("ana.example.com", "Ana", "longenough").unwrap_err().field,
            "email"
        );
        assert_eq!(
            validate_registration("ana@example", "Ana", "longenough").unwrap_err().field,
            "email"
        );
        assert_eq!(
            validate_registration("ana@example.com", " ", "longenough").unwrap_err().field,
            "name"
        );
        assert_eq!(
            validate_registration("ana@example.com", "Ana", "short").unwrap_err().field,
            "password"
        );
    }

    #[test]
    fn task_is_normalized_and_dates_checked() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day);
        let mut ok = task(d(1), d(3));
        validate_task(&mut ok).unwrap();
        assert_eq!(ok.title, "Regar");
        assert_eq!(ok.zone, None);

        let mut inverted = task(d(5), d(3));
        assert_eq!(validate_task(&mut inverted).unwrap_err().field, "due_date");

        let mut blank = task(None, None);
        blank.title = " ".to_string();
        assert_eq!(validate_task(&mut blank).unwrap_err().field, "title");
    }

    #[test]
    fn movement_amount_must_be_positive_and_finite() {
        let mut data = CreateFinanceMovement {
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            concept: "Venta".to_string(),
            category: "Cosecha".to_string(),
            movement_type: MovementType::Income,
            amount: 10.0,
            note: None,
            invoice_number: None,
        };
        assert!(validate_movement(&data).is_ok());
        data.amount = -1.0;
        assert!(validate_movement(&data).is_err());
        data.amount = f64::NAN;
        assert!(validate_movement(&data).is_err());
    }

    #[test]
    fn asset_residual_bounds() {
        assert!(validate_asset(&asset(1000.0, 0.0, 5)).is_ok());
        assert!(validate_asset(&asset(1000.0, 1000.0, 5)).is_ok());
        assert_eq!(validate_asset(&asset(1000.0, 1200.0, 5)).unwrap_err().field, "residual_value");
        assert_eq!(validate_asset(&asset(1000.0, 0.0, 0)).unwrap_err().field, "useful_life_years");
    }

    #[test]
    fn map_feature_data_must_be_object() {
        let ok = CreateMapFeature {
            data: json!({"type": "Feature"}),
            components: None,
        };
        let bad = CreateMapFeature {
            data: json!([1, 2]),
            components: None,
        };
        assert!(validate_map_feature(&ok).is_ok());
        assert!(validate_map_feature(&bad).is_err());
    }

    #[test]
    fn farm_name_is_trimmed() {
        let mut farm = CreateFarm {
            name: "  El Olivar ".to_string(),
            view: None,
            preferred_center: None,
        };
        validate_farm(&mut farm).unwrap();
        assert_eq!(farm.name, "El Olivar");
    }
}
