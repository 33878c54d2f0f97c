use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope wrapping every JSON body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_no_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error("farm not found")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "data": null, "message": "farm not found"})
        );
    }

    #[test]
    fn success_envelope_wraps_data() {
        let body = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body["message"].is_null());
    }
}
