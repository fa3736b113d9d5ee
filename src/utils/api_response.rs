use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Shared JSON envelope for every endpoint. `error` carries the stable
/// error category string, `details` optional structured context.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: Some(data),
            error: None,
            details: None,
        }
    }

    /// Create an error response
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        category: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        ApiResponse {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: None,
            error: Some(category.into()),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_skips_error_fields() {
        let resp = ApiResponse::success(StatusCode::OK, "ok", serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["status_code"], 200);
        assert!(value.get("error").is_none());
        assert!(value.get("details").is_none());
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn error_envelope_carries_category() {
        let resp = ApiResponse::<()>::error(
            StatusCode::CONFLICT,
            "Duplicate request already pending",
            "conflict",
            None,
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["status_code"], 409);
        assert_eq!(value["error"], "conflict");
        assert!(value.get("data").is_none());
    }
}
