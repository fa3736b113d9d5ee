// src/db/models/notification.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Clone, Debug, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub title: String,
    pub body: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub type_field: String,
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub dismissible: bool,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
}

