use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid target provided: {0}")]
    InvalidTarget(String),
}

/// Notification builder for creating in-app notifications
pub struct NotificationBuilder {
    title: String,
    body: Option<String>,
    notification_type: String,
    target_users: Vec<i32>,
    broadcast_admins: bool,
    action_type: Option<String>,
    action_data: Option<Value>,
    dismissible: bool,
    expires_in_days: Option<i64>,
}

impl NotificationBuilder {
    /// Create a new notification builder with required fields
    pub fn new(title: impl Into<String>, notification_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            notification_type: notification_type.into(),
            target_users: Vec::new(),
            broadcast_admins: false,
            action_type: None,
            action_data: None,
            dismissible: true,
            expires_in_days: Some(14),
        }
    }

    /// Set notification body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a target user to the notification
    pub fn target_user(mut self, user_id: i32) -> Self {
        self.target_users.push(user_id);
        self
    }

    /// Target every account with the admin role, resolved at send time
    pub fn target_admins(mut self) -> Self {
        self.broadcast_admins = true;
        self
    }

    /// Set the action type and data for when notification is clicked
    pub fn action(mut self, action_type: impl Into<String>, action_data: Value) -> Self {
        self.action_type = Some(action_type.into());
        self.action_data = Some(action_data);
        self
    }

    /// Set whether the notification can be dismissed
    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    /// Set expiration time in days (None means no expiration)
    pub fn expires_in_days(mut self, days: Option<i64>) -> Self {
        self.expires_in_days = days;
        self
    }

    fn validate(&self) -> NotificationResult<()> {
        if self.target_users.is_empty() && !self.broadcast_admins {
            return Err(NotificationError::InvalidTarget(
                "At least one target is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Build and send the notification
    pub async fn send(self, pool: &PgPool) -> NotificationResult<i32> {
        self.validate()?;

        let expires_at = self
            .expires_in_days
            .map(|days| (Utc::now() + chrono::Duration::days(days)).naive_utc());

        let mut targets = self.target_users.clone();
        if self.broadcast_admins {
            let admin_ids: Vec<i32> =
                sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin'")
                    .fetch_all(pool)
                    .await?;
            targets.extend(admin_ids);
        }
        targets.sort_unstable();
        targets.dedup();

        if targets.is_empty() {
            return Err(NotificationError::InvalidTarget(
                "No admin accounts found for broadcast".to_string(),
            ));
        }

        let mut tx = pool.begin().await?;

        let notification_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (
                title, body, type, action_type, action_data, dismissible, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&self.title)
        .bind(&self.body)
        .bind(&self.notification_type)
        .bind(&self.action_type)
        .bind(&self.action_data)
        .bind(self.dismissible)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        for user_id in &targets {
            sqlx::query(
                "INSERT INTO notification_targets (notification_id, user_id) VALUES ($1, $2)",
            )
            .bind(notification_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(notification_id)
    }
}

/// Common notification types for system usage
pub mod notification_types {
    pub const AUTHOR_REQUEST_SUBMITTED: &str = "author_request_submitted";
    pub const AUTHOR_REQUEST_APPROVED: &str = "author_request_approved";
    pub const AUTHOR_REQUEST_REJECTED: &str = "author_request_rejected";
    pub const SYSTEM_ANNOUNCEMENT: &str = "system_announcement";
}

/// Notify every admin that a new author request needs review
pub async fn notify_admins_new_request(
    pool: &PgPool,
    requester_name: &str,
    request_id: i32,
) -> NotificationResult<i32> {
    NotificationBuilder::new(
        format!("Author request: {}", requester_name),
        notification_types::AUTHOR_REQUEST_SUBMITTED,
    )
    .body(format!(
        "{} has requested author status and is awaiting review",
        requester_name
    ))
    .target_admins()
    .action("view_author_request", json!({ "request_id": request_id }))
    .send(pool)
    .await
}

/// Tell the requester their promotion went through
pub async fn notify_request_approved(
    pool: &PgPool,
    user_id: i32,
    request_id: i32,
) -> NotificationResult<i32> {
    NotificationBuilder::new(
        "Your author request was approved",
        notification_types::AUTHOR_REQUEST_APPROVED,
    )
    .body("Your account now has author privileges")
    .target_user(user_id)
    .action("view_author_request", json!({ "request_id": request_id }))
    .send(pool)
    .await
}

/// Tell the requester their request was declined, with the reason
pub async fn notify_request_rejected(
    pool: &PgPool,
    user_id: i32,
    request_id: i32,
    reason: &str,
) -> NotificationResult<i32> {
    NotificationBuilder::new(
        "Your author request was not approved",
        notification_types::AUTHOR_REQUEST_REJECTED,
    )
    .body(reason.to_string())
    .target_user(user_id)
    .action("view_author_request", json!({ "request_id": request_id }))
    .send(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_a_target() {
        let builder = NotificationBuilder::new("t", notification_types::SYSTEM_ANNOUNCEMENT);
        assert!(matches!(
            builder.validate(),
            Err(NotificationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn admin_broadcast_counts_as_target() {
        let builder = NotificationBuilder::new("t", notification_types::AUTHOR_REQUEST_SUBMITTED)
            .target_admins();
        assert!(builder.validate().is_ok());
    }

    #[test]
    fn explicit_user_counts_as_target() {
        let builder =
            NotificationBuilder::new("t", notification_types::AUTHOR_REQUEST_APPROVED)
                .target_user(7);
        assert!(builder.validate().is_ok());
    }
}
