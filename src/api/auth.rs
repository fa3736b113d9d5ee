use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::models::user::{User, UserInfo, UserRole};
use crate::utils::api_response::ApiResponse;
use crate::utils::error::ApiError;

/// Represents a request to register a new user.
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired username
    pub username: String,
    /// User password
    pub password: String,
    pub email: Option<String>,
}

/// JWT Claims used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - User ID as String
    pub sub: String,
    /// The username of the authenticated user.
    pub username: String,
    /// The role assigned to the user at token issue time.
    pub role: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    /// Converts `sub` (user ID) to `i32`, or returns a descriptive error.
    pub fn user_id(&self) -> Result<i32, ApiError> {
        self.sub
            .parse::<i32>()
            .map_err(|_| ApiError::validation("Invalid user ID format in token"))
    }
}

/// Represents a request to log in
#[derive(Serialize, Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response returning a JWT token.
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub role: UserRole,
}

/// Handles user login.
///
/// # Returns
/// * `200 OK` - Returns a JWT token if authentication is successful.
/// * `401 Unauthorized` - If credentials are incorrect.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "Account locked"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn login(
    State(pool): State<PgPool>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let config = Config::get();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, email, role, account_locked, created_at, updated_at
         FROM users WHERE username = $1",
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to look up user", e))?;

    let Some(user) = user else {
        warn!("❌ Login attempt for non-existent user: {}", payload.username);
        return Err(ApiError::unauthorized("Invalid username or password."));
    };

    // 🔒 Deny login if the account is locked
    if user.account_locked {
        warn!("🔒 Login attempt for locked account: {}", payload.username);
        return Err(ApiError::forbidden(
            "Account is locked. Contact your administrator.",
        ));
    }

    let valid = verify(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::dependency("Password verification error", e))?;
    if !valid {
        warn!("❌ Invalid password attempt for user: {}", payload.username);
        return Err(ApiError::unauthorized("Invalid username or password."));
    }

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.as_str().to_string(),
        exp: chrono::Utc::now().timestamp() as usize + 36000, // 10 hour expiration
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::dependency("Token generation failed", e))?;

    info!("✅ Login successful for user: {}", payload.username);
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Login successful",
        LoginResponse {
            token,
            role: user.role,
        },
    ))
}

/// Handles user registration. New accounts always start with the `user`
/// role; author status is only granted through the request workflow.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = UserInfo),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<UserInfo>, ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(&payload.username)
            .fetch_one(&pool)
            .await
            .map_err(|e| ApiError::dependency("Failed to check username", e))?;
    if taken {
        return Err(ApiError::conflict("Username already taken"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| ApiError::dependency("Password hashing failed", e))?;

    let user = sqlx::query_as::<_, UserInfo>(
        "INSERT INTO users (username, password_hash, email, role)
         VALUES ($1, $2, $3, 'user')
         RETURNING id, username, email, role",
    )
    .bind(&payload.username)
    .bind(&password_hash)
    .bind(&payload.email)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to create user", e))?;

    info!("✅ Registered new user: {}", user.username);
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Registration successful",
        user,
    ))
}

/// Returns the identity baked into the caller's token.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current token identity"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(Extension(claims): Extension<Claims>) -> Result<ApiResponse<Claims>, ApiError> {
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Token identity",
        claims,
    ))
}

pub fn auth_routes() -> Router<PgPool> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

pub fn secure_auth_routes() -> Router<PgPool> {
    Router::new().route("/auth/me", get(me))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(login, register, me),
    components(schemas(LoginRequest, LoginResponse, RegisterRequest, UserInfo)),
    tags(
        (name = "Authentication", description = "Login, registration and token identity")
    )
)]
pub struct AuthDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_user_id_parses_numeric_sub() {
        let claims = Claims {
            sub: "42".to_string(),
            username: "ada".to_string(),
            role: "user".to_string(),
            exp: 0,
        };
        assert_eq!(claims.user_id().unwrap(), 42);
    }

    #[test]
    fn claims_user_id_rejects_garbage_sub() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            username: "ada".to_string(),
            role: "user".to_string(),
            exp: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
