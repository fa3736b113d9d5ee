use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::author_request::*;
use crate::db::queries::review::{approve_author_request, reject_author_request};

pub fn author_request_routes() -> Router<PgPool> {
    Router::new()
        .route(
            "/author-requests",
            post(create_author_request).get(get_author_requests),
        )
        .route("/author-requests/me", get(get_my_author_request))
        .route(
            "/author-requests/{id}",
            get(get_author_request)
                .put(update_author_request)
                .delete(delete_author_request),
        )
        .route("/author-requests/{id}/approve", put(approve_author_request))
        .route("/author-requests/{id}/reject", put(reject_author_request))
        .route("/author-requests/{id}/articles", post(add_requested_article))
        .route(
            "/author-requests/{id}/articles/{item_id}",
            delete(remove_requested_article),
        )
        .route("/author-requests/{id}/journals", post(add_requested_journal))
        .route(
            "/author-requests/{id}/journals/{item_id}",
            delete(remove_requested_journal),
        )
        .route("/author-requests/{id}/books", post(add_requested_book))
        .route(
            "/author-requests/{id}/books/{item_id}",
            delete(remove_requested_book),
        )
        .route(
            "/author-requests/{id}/institutions",
            post(add_requested_institution),
        )
        .route(
            "/author-requests/{id}/institutions/{item_id}",
            delete(remove_requested_institution),
        )
}
