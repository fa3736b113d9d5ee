// src/db/models/file.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Kind half of the polymorphic attachment key. A file belongs to exactly
/// one owning entity at a time; a typed kind prevents mismatched-kind bugs
/// that a loose string column invites.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "content_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    AuthorRequest,
    Article,
    Journal,
    Book,
    Author,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::AuthorRequest => "author_request",
            ContentKind::Article => "article",
            ContentKind::Journal => "journal",
            ContentKind::Book => "book",
            ContentKind::Author => "author",
        }
    }
}

/// The full polymorphic key: which entity, and which row of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub kind: ContentKind,
    pub id: i32,
}

impl FileOwner {
    pub fn request(id: i32) -> Self {
        Self { kind: ContentKind::AuthorRequest, id }
    }

    pub fn article(id: i32) -> Self {
        Self { kind: ContentKind::Article, id }
    }

    pub fn journal(id: i32) -> Self {
        Self { kind: ContentKind::Journal, id }
    }

    pub fn book(id: i32) -> Self {
        Self { kind: ContentKind::Book, id }
    }
}

/// Stored attachment metadata. The blob itself lives in external storage;
/// only the owning key, version and uploader are tracked here.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FileRecord {
    pub id: i32,
    pub file_name: String,
    pub content_kind: ContentKind,
    pub content_id: i32,
    pub version: i32,
    pub uploaded_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_constructors_tag_the_kind() {
        assert_eq!(FileOwner::request(3).kind, ContentKind::AuthorRequest);
        assert_eq!(FileOwner::article(5).kind, ContentKind::Article);
        assert_eq!(FileOwner::journal(7).kind, ContentKind::Journal);
        assert_eq!(FileOwner::book(9).kind, ContentKind::Book);
    }

    #[test]
    fn kind_strings_match_db_enum_labels() {
        assert_eq!(ContentKind::AuthorRequest.as_str(), "author_request");
        assert_eq!(
            serde_json::to_value(ContentKind::AuthorRequest).unwrap(),
            "author_request"
        );
    }
}
