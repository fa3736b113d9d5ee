// src/api/notification.rs
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::notification::*;

pub fn notification_routes() -> Router<PgPool> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/notifications/count", get(get_notification_count))
        .route(
            "/notifications/dismiss-all",
            post(dismiss_all_notifications),
        )
        .route(
            "/notifications/{notification_id}/dismiss",
            post(dismiss_notification),
        )
}
