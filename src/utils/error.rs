use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::utils::api_response::ApiResponse;

/// Error taxonomy shared by every handler. Each variant maps to a fixed
/// HTTP status and a stable category string in the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Missing or bad credentials (ambient auth layer, not the guard).
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Entity store or notification gateway failure. The source message is
    /// surfaced in `details`, never a stack trace.
    #[error("{message}")]
    Dependency {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn dependency(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Dependency {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Dependency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable category string carried in the `error` envelope field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Dependency { .. } => "dependency_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let details = match &self {
            ApiError::Dependency { source, .. } => Some(json!({ "error": source.to_string() })),
            _ => None,
        };
        ApiResponse::<()>::error(self.status(), self.to_string(), self.category(), details)
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_stable() {
        assert_eq!(ApiError::validation("x").category(), "validation_error");
        assert_eq!(ApiError::conflict("x").category(), "conflict");
        assert_eq!(ApiError::unauthorized("x").category(), "unauthorized");
        assert_eq!(ApiError::forbidden("x").category(), "forbidden");
        assert_eq!(ApiError::not_found("x").category(), "not_found");
        let dep = ApiError::dependency("x", anyhow::anyhow!("boom"));
        assert_eq!(dep.category(), "dependency_error");
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::unauthorized("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        let dep = ApiError::dependency("x", anyhow::anyhow!("boom"));
        assert_eq!(dep.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn dependency_message_hides_source_chain() {
        let dep = ApiError::dependency("Failed to insert author", anyhow::anyhow!("io fail"));
        assert_eq!(dep.to_string(), "Failed to insert author");
    }
}
