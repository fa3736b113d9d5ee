use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::PgPool;

use crate::api::auth::Claims;
use crate::db::models::notification::Notification;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::ApiError;

const VISIBLE_FOR_USER: &str = "FROM notifications n
     JOIN notification_targets t ON t.notification_id = n.id
    WHERE t.user_id = $1
      AND (n.expires_at IS NULL OR n.expires_at > NOW())
      AND NOT EXISTS (
            SELECT 1 FROM notification_dismissals d
             WHERE d.notification_id = n.id AND d.user_id = $1
      )";

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Active notifications for the caller", body = [Notification]),
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<Notification>>, ApiError> {
    let user_id = claims.user_id()?;

    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT n.id, n.title, n.body, n.type, n.action_type, n.action_data,
                n.dismissible, n.created_at, n.expires_at
         {VISIBLE_FOR_USER}
         ORDER BY n.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to retrieve notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications retrieved",
        notifications,
    ))
}

#[utoipa::path(
    get,
    path = "/notifications/count",
    responses(
        (status = 200, description = "Count of active notifications"),
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notification_count(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let user_id = claims.user_id()?;

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {VISIBLE_FOR_USER}"))
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .map_err(|e| ApiError::dependency("Failed to count notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification count",
        json!({ "count": count }),
    ))
}

#[utoipa::path(
    post,
    path = "/notifications/{notification_id}/dismiss",
    params(("notification_id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification dismissed"),
        (status = 404, description = "Notification not targeted at the caller")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn dismiss_notification(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    let user_id = claims.user_id()?;

    let targeted: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM notification_targets
            WHERE notification_id = $1 AND user_id = $2
        )",
    )
    .bind(notification_id)
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to check notification", e))?;

    if !targeted {
        return Err(ApiError::not_found("Notification not found"));
    }

    sqlx::query(
        "INSERT INTO notification_dismissals (notification_id, user_id)
         VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to dismiss notification", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification dismissed",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/notifications/dismiss-all",
    responses(
        (status = 200, description = "All notifications dismissed"),
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn dismiss_all_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query(
        "INSERT INTO notification_dismissals (notification_id, user_id)
         SELECT t.notification_id, t.user_id
           FROM notification_targets t
          WHERE t.user_id = $1
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .execute(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to dismiss notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications dismissed",
        json!({ "dismissed": result.rows_affected() }),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        get_notifications,
        get_notification_count,
        dismiss_notification,
        dismiss_all_notifications
    ),
    components(schemas(Notification)),
    tags(
        (name = "Notifications", description = "In-app notification endpoints")
    )
)]
pub struct NotificationDoc;
