use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Account role. Promotion from `User` to `Author` happens as a side
/// effect of author-request approval, never by self-service.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Author,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Author => "author",
            UserRole::Admin => "admin",
        }
    }

    /// Only plain users may submit an author request.
    pub fn may_request_authorship(&self) -> bool {
        matches!(self, UserRole::User)
    }
}

#[derive(Serialize, Deserialize, Debug, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub account_locked: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Deserialize, Serialize, FromRow, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plain_users_may_request_authorship() {
        assert!(UserRole::User.may_request_authorship());
        assert!(!UserRole::Author.may_request_authorship());
        assert!(!UserRole::Admin.may_request_authorship());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_value(UserRole::Admin).unwrap(), "admin");
        assert_eq!(UserRole::Author.as_str(), "author");
    }
}
