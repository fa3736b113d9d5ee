use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use sqlx::PgPool;

use crate::api::auth::Claims;
use crate::db::models::user::UserInfo;
use crate::middleware::auth::UserPermissions;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::ApiError;

// User creation is handled by /auth/register.

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "List all users", body = [UserInfo]),
        (status = 403, description = "Admin role required"),
        (status = 500, description = "Failed to retrieve users")
    ),
    tag = "Users",
    security(("bearerAuth" = []))
)]
pub async fn get_all_users(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
) -> Result<ApiResponse<Vec<UserInfo>>, ApiError> {
    perms.require_admin()?;

    let users = sqlx::query_as::<_, UserInfo>(
        "SELECT id, username, email, role FROM users ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to retrieve users", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Users retrieved successfully",
        users,
    ))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Retrieve a single user", body = UserInfo),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearerAuth" = []))
)]
pub async fn get_user(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserInfo>, ApiError> {
    perms.require_owner_or_admin(id)?;

    let user = sqlx::query_as::<_, UserInfo>(
        "SELECT id, username, email, role FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to retrieve user", e))?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "User retrieved successfully",
        user,
    ))
}

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserInfo),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearerAuth" = []))
)]
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<UserInfo>, ApiError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, UserInfo>(
        "SELECT id, username, email, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to retrieve user", e))?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "User retrieved successfully",
        user,
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(get_all_users, get_user, get_me),
    components(schemas(UserInfo)),
    tags(
        (name = "Users", description = "User lookup endpoints")
    )
)]
pub struct UserDoc;
