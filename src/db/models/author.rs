// src/db/models/author.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Canonical author record, created (or re-used) when a request is
/// approved. `user_id` links back to the promoted account and is unique.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub academic_title: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub institution_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Canonical institution. Deduplicated by exact (name, country, city)
/// during approval rather than always inserted.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Institution {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
