// src/db/models/author_request.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::db::models::file::FileRecord;

/// Review lifecycle of an author request. A request leaves `Pending`
/// exactly once and both other states are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(self, RequestStatus::Pending) && next.is_terminal()
    }
}

/// One user's claim to author status.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorRequest {
    pub id: i32,
    pub user_id: i32,
    pub academic_title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub reason_for_request: Option<String>,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

//
// Claimed works: free-form records attached to a request, kept after
// review as an audit trail. Materialized into canonical entities on
// approval.
//

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestedArticle {
    pub id: i32,
    pub request_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    #[sqlx(rename = "abstract")]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub language: Option<String>,
    pub doi: Option<String>,
    pub published_on: Option<NaiveDate>,
    pub publisher: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestedJournal {
    pub id: i32,
    pub request_id: i32,
    pub title: String,
    pub issn: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestedBook {
    pub id: i32,
    pub request_id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub published_on: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestedInstitution {
    pub id: i32,
    pub request_id: i32,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

//
// Submission payloads
//

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewRequestedArticle {
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub language: Option<String>,
    pub doi: Option<String>,
    pub published_on: Option<NaiveDate>,
    pub publisher: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewRequestedJournal {
    pub title: String,
    pub issn: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewRequestedBook {
    pub title: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub published_on: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewRequestedInstitution {
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewAuthorRequest {
    pub academic_title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub reason_for_request: Option<String>,
    #[serde(default)]
    pub articles: Vec<NewRequestedArticle>,
    #[serde(default)]
    pub journals: Vec<NewRequestedJournal>,
    #[serde(default)]
    pub books: Vec<NewRequestedBook>,
    #[serde(default)]
    pub institutions: Vec<NewRequestedInstitution>,
    #[serde(default)]
    pub file_ids: Vec<i32>,
}

impl NewAuthorRequest {
    /// Field validation run before any row is written.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() {
            return Err("first_name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            return Err("last_name is required".to_string());
        }
        if self.articles.iter().any(|a| a.title.trim().is_empty()) {
            return Err("Every claimed article needs a title".to_string());
        }
        if self.journals.iter().any(|j| j.title.trim().is_empty()) {
            return Err("Every claimed journal needs a title".to_string());
        }
        if self.books.iter().any(|b| b.title.trim().is_empty()) {
            return Err("Every claimed book needs a title".to_string());
        }
        if self.institutions.iter().any(|i| i.name.trim().is_empty()) {
            return Err("Every claimed institution needs a name".to_string());
        }
        Ok(())
    }
}

/// Owner-side partial update, allowed while the request is still pending.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAuthorRequest {
    pub academic_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub reason_for_request: Option<String>,
}

impl UpdateAuthorRequest {
    pub fn is_empty(&self) -> bool {
        self.academic_title.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.reason_for_request.is_none()
    }
}

//
// Review payloads
//

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApprovePayload {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectPayload {
    /// Rejection reason shown to the requester. Required.
    pub admin_notes: Option<String>,
}

/// Returned by the approval engine, from either the stored-procedure fast
/// path or the manual fallback.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApprovalOutcome {
    pub request_id: i32,
    pub author_id: i32,
    pub user_id: i32,
}

/// Full request graph as returned to owners and admins.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorRequestDetail {
    #[serde(flatten)]
    pub request: AuthorRequest,
    pub articles: Vec<RequestedArticle>,
    pub journals: Vec<RequestedJournal>,
    pub books: Vec<RequestedBook>,
    pub institutions: Vec<RequestedInstitution>,
    pub files: Vec<FileRecord>,
}

/// Admin listing filters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRequestParams {
    pub status: Option<RequestStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Substring match on first or last name.
    pub search: Option<String>,
    /// One of created_at | updated_at | status.
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestPage {
    pub items: Vec<AuthorRequest>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_payload() -> NewAuthorRequest {
        NewAuthorRequest {
            academic_title: None,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            bio: None,
            reason_for_request: None,
            articles: vec![],
            journals: vec![],
            books: vec![],
            institutions: vec![],
            file_ids: vec![],
        }
    }

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn transitions_only_leave_pending() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Approved.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Approved));
    }

    #[test]
    fn validate_accepts_minimal_payload() {
        assert!(minimal_payload().validate().is_ok());
    }

    #[test]
    fn validate_requires_names() {
        let mut payload = minimal_payload();
        payload.first_name = "   ".to_string();
        assert!(payload.validate().is_err());

        let mut payload = minimal_payload();
        payload.last_name = String::new();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn validate_rejects_untitled_claimed_work() {
        let mut payload = minimal_payload();
        payload.articles.push(NewRequestedArticle {
            title: "".to_string(),
            subtitle: None,
            abstract_text: None,
            language: None,
            doi: None,
            published_on: None,
            publisher: None,
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        let update = UpdateAuthorRequest {
            academic_title: None,
            first_name: None,
            last_name: None,
            bio: None,
            reason_for_request: None,
        };
        assert!(update.is_empty());

        let update = UpdateAuthorRequest {
            academic_title: None,
            first_name: Some("Ada".to_string()),
            last_name: None,
            bio: None,
            reason_for_request: None,
        };
        assert!(!update.is_empty());
    }
}
