// src/db/queries/review.rs
//
// Review engine for author requests: pending -> approved | rejected,
// exactly once. Approval materializes the claimed works into canonical
// entities. A stored-procedure fast path is tried first; when it is
// unavailable the manual sequence below runs without a shared
// transaction, so every step is written to be re-appliable and the
// failing step is logged by name for manual recovery.
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use crate::api::auth::Claims;
use crate::db::models::author::{Author, Institution};
use crate::db::models::author_request::{
    ApprovalOutcome, ApprovePayload, AuthorRequest, RejectPayload,
};
use crate::db::models::file::FileOwner;
use crate::db::models::publication::{Article, Book, Journal};
use crate::db::queries::author_request::{load_children, REQUEST_COLUMNS};
use crate::db::queries::file::retarget_files;
use crate::middleware::auth::{invalidate_user, PermissionCache, UserPermissions};
use crate::utils::api_response::ApiResponse;
use crate::utils::email;
use crate::utils::error::ApiError;
use crate::utils::notification;

fn step_failed(step: &'static str, e: sqlx::Error) -> ApiError {
    error!("Approval aborted at step '{step}': {e}");
    ApiError::dependency(format!("Approval failed at step '{step}'"), e)
}

async fn requester_email(pool: &PgPool, user_id: i32) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Single-call transactional approval, when the database ships the
/// procedure. Errors fall back to the manual sequence.
async fn approve_via_procedure(
    pool: &PgPool,
    request_id: i32,
    admin_id: i32,
    admin_notes: Option<&str>,
) -> Result<ApprovalOutcome, sqlx::Error> {
    sqlx::query_as::<_, ApprovalOutcome>(
        "SELECT request_id, author_id, user_id FROM approve_author_request($1, $2, $3)",
    )
    .bind(request_id)
    .bind(admin_id)
    .bind(admin_notes)
    .fetch_one(pool)
    .await
}

/// Manual approval sequence. No cross-step transaction: a failure aborts
/// the remaining steps, the request stays pending, and the admin retries.
/// Steps 1-3 are upserts/idempotent updates so the replay converges.
async fn approve_manually(
    pool: &PgPool,
    request: &AuthorRequest,
    admin_id: i32,
    admin_notes: Option<&str>,
) -> Result<ApprovalOutcome, ApiError> {
    let (articles, journals, books, institutions) = load_children(pool, request.id)
        .await
        .map_err(|e| step_failed("load_claimed_works", e))?;

    let email: Option<String> = requester_email(pool, request.user_id)
        .await
        .map_err(|e| step_failed("load_requester", e))?;

    // Step 1: author record, upsert keyed by user_id.
    let author = sqlx::query_as::<_, Author>(
        "INSERT INTO authors (user_id, first_name, last_name, academic_title, email, bio)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (user_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                academic_title = EXCLUDED.academic_title,
                email = EXCLUDED.email,
                bio = EXCLUDED.bio,
                updated_at = NOW()
         RETURNING id, user_id, first_name, last_name, academic_title, email, bio,
                   institution_id, created_at, updated_at",
    )
    .bind(request.user_id)
    .bind(&request.first_name)
    .bind(&request.last_name)
    .bind(&request.academic_title)
    .bind(&email)
    .bind(&request.bio)
    .fetch_one(pool)
    .await
    .map_err(|e| step_failed("upsert_author", e))?;
    debug!("Approval of request {}: author id {}", request.id, author.id);

    // Step 2: role promotion.
    sqlx::query("UPDATE users SET role = 'author', updated_at = NOW() WHERE id = $1")
        .bind(request.user_id)
        .execute(pool)
        .await
        .map_err(|e| step_failed("promote_role", e))?;

    // Step 3: institutions, deduplicated by exact (name, country, city).
    // The first resolved institution becomes the author's affiliation.
    let mut resolved_institutions: Vec<Institution> = Vec::with_capacity(institutions.len());
    for claimed in &institutions {
        let existing = sqlx::query_as::<_, Institution>(
            "SELECT id, name, country, city, website, created_at, updated_at
             FROM institutions
             WHERE name = $1
               AND country IS NOT DISTINCT FROM $2
               AND city IS NOT DISTINCT FROM $3",
        )
        .bind(&claimed.name)
        .bind(&claimed.country)
        .bind(&claimed.city)
        .fetch_optional(pool)
        .await
        .map_err(|e| step_failed("resolve_institution", e))?;

        let institution = match existing {
            Some(institution) => institution,
            None => sqlx::query_as::<_, Institution>(
                "INSERT INTO institutions (name, country, city, website)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, name, country, city, website, created_at, updated_at",
            )
            .bind(&claimed.name)
            .bind(&claimed.country)
            .bind(&claimed.city)
            .bind(&claimed.website)
            .fetch_one(pool)
            .await
            .map_err(|e| step_failed("insert_institution", e))?,
        };
        resolved_institutions.push(institution);
    }
    if let Some(institution) = resolved_institutions.first() {
        sqlx::query("UPDATE authors SET institution_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(institution.id)
            .bind(author.id)
            .execute(pool)
            .await
            .map_err(|e| step_failed("attach_institution", e))?;
    }

    // Step 4: articles. Files riding on the request are re-pointed per
    // article; when several articles share them, the last one keeps them.
    for claimed in &articles {
        let article = sqlx::query_as::<_, Article>(
            "INSERT INTO articles
                (title, subtitle, abstract, language, doi, published_on, publisher, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, title, subtitle, abstract, language, doi, published_on, publisher,
                       updated_by, created_at, updated_at",
        )
        .bind(&claimed.title)
        .bind(&claimed.subtitle)
        .bind(&claimed.abstract_text)
        .bind(&claimed.language)
        .bind(&claimed.doi)
        .bind(claimed.published_on)
        .bind(&claimed.publisher)
        .bind(admin_id)
        .fetch_one(pool)
        .await
        .map_err(|e| step_failed("materialize_article", e))?;

        sqlx::query(
            "INSERT INTO author_articles (author_id, article_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(author.id)
        .bind(article.id)
        .execute(pool)
        .await
        .map_err(|e| step_failed("link_article", e))?;

        retarget_files(
            pool,
            FileOwner::request(request.id),
            FileOwner::article(article.id),
        )
        .await
        .map_err(|e| step_failed("retarget_article_files", e))?;
    }

    // Step 5a: journals. Not linked back to the author.
    for claimed in &journals {
        let journal = sqlx::query_as::<_, Journal>(
            "INSERT INTO journals (title, issn, publisher, language, website, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, title, issn, publisher, language, website, updated_by,
                       created_at, updated_at",
        )
        .bind(&claimed.title)
        .bind(&claimed.issn)
        .bind(&claimed.publisher)
        .bind(&claimed.language)
        .bind(&claimed.website)
        .bind(admin_id)
        .fetch_one(pool)
        .await
        .map_err(|e| step_failed("materialize_journal", e))?;

        retarget_files(
            pool,
            FileOwner::request(request.id),
            FileOwner::journal(journal.id),
        )
        .await
        .map_err(|e| step_failed("retarget_journal_files", e))?;
    }

    // Step 5b: books, mirroring the article pattern.
    for claimed in &books {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, isbn, publisher, language, published_on, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, title, isbn, publisher, language, published_on, updated_by,
                       created_at, updated_at",
        )
        .bind(&claimed.title)
        .bind(&claimed.isbn)
        .bind(&claimed.publisher)
        .bind(&claimed.language)
        .bind(claimed.published_on)
        .bind(admin_id)
        .fetch_one(pool)
        .await
        .map_err(|e| step_failed("materialize_book", e))?;

        sqlx::query(
            "INSERT INTO author_books (author_id, book_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(author.id)
        .bind(book.id)
        .execute(pool)
        .await
        .map_err(|e| step_failed("link_book", e))?;

        retarget_files(
            pool,
            FileOwner::request(request.id),
            FileOwner::book(book.id),
        )
        .await
        .map_err(|e| step_failed("retarget_book_files", e))?;
    }

    // Step 6: terminal transition. The pending filter is the concurrency
    // guard; a concurrent reviewer leaves zero rows for us here.
    let updated = sqlx::query(
        "UPDATE author_requests
            SET status = 'approved', admin_notes = $1, reviewed_by = $2, updated_at = NOW()
          WHERE id = $3 AND status = 'pending'",
    )
    .bind(admin_notes)
    .bind(admin_id)
    .bind(request.id)
    .execute(pool)
    .await
    .map_err(|e| step_failed("mark_approved", e))?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found(
            "Author request was reviewed by someone else",
        ));
    }

    Ok(ApprovalOutcome {
        request_id: request.id,
        author_id: author.id,
        user_id: request.user_id,
    })
}

/// Step 7 on both paths: tell the requester. Never fails the approval.
async fn notify_approval(pool: &PgPool, request: &AuthorRequest, outcome: &ApprovalOutcome) {
    if let Err(e) =
        notification::notify_request_approved(pool, outcome.user_id, outcome.request_id).await
    {
        warn!("Failed to create approval notification for request {}: {e}", outcome.request_id);
    }

    match requester_email(pool, outcome.user_id).await {
        Ok(Some(address)) => {
            if let Err(e) = email::send_author_approval(&address, &request.first_name).await {
                warn!("Failed to send approval email for request {}: {e}", outcome.request_id);
            }
        }
        Ok(None) => warn!(
            "No email on file for user {}, skipping approval email",
            outcome.user_id
        ),
        Err(e) => warn!("Failed to load requester email: {e}"),
    }
}

#[utoipa::path(
    put,
    path = "/author-requests/{id}/approve",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = ApprovePayload,
    responses(
        (status = 200, description = "Author request approved", body = ApprovalOutcome),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Not found or not pending"),
        (status = 500, description = "Approval sequence failed; request stays pending")
    ),
    tag = "Review",
    security(("bearerAuth" = []))
)]
pub async fn approve_author_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(perms): Extension<UserPermissions>,
    Extension(permission_cache): Extension<PermissionCache>,
    Path(request_id): Path<i32>,
    Json(payload): Json<ApprovePayload>,
) -> Result<ApiResponse<ApprovalOutcome>, ApiError> {
    perms.require_admin()?;
    let admin_id = claims.user_id()?;

    // Pending-filtered fetch: a request already reviewed (or reviewed
    // concurrently) is simply not found.
    let request = sqlx::query_as::<_, AuthorRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM author_requests WHERE id = $1 AND status = 'pending'"
    ))
    .bind(request_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to look up author request", e))?
    .ok_or_else(|| ApiError::not_found("Author request not found or not pending"))?;

    let outcome = match approve_via_procedure(
        &pool,
        request_id,
        admin_id,
        payload.admin_notes.as_deref(),
    )
    .await
    {
        Ok(outcome) => {
            debug!("Request {request_id} approved via stored procedure");
            outcome
        }
        Err(e) => {
            warn!(
                "Stored procedure approval unavailable for request {request_id}, \
                 falling back to manual sequence: {e}"
            );
            approve_manually(&pool, &request, admin_id, payload.admin_notes.as_deref()).await?
        }
    };

    // The promoted account must see its new role on the next request.
    invalidate_user(&permission_cache, outcome.user_id);

    notify_approval(&pool, &request, &outcome).await;

    info!(
        "Author request {} approved by admin {admin_id}: author {}",
        outcome.request_id, outcome.author_id
    );
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author request approved",
        outcome,
    ))
}

#[utoipa::path(
    put,
    path = "/author-requests/{id}/reject",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Author request rejected"),
        (status = 400, description = "Missing rejection reason"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Not found or not pending")
    ),
    tag = "Review",
    security(("bearerAuth" = []))
)]
pub async fn reject_author_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<RejectPayload>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    perms.require_admin()?;
    let admin_id = claims.user_id()?;

    let reason = payload
        .admin_notes
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Rejection reason is required"))?
        .to_string();

    let rejected = sqlx::query_as::<_, AuthorRequest>(&format!(
        "UPDATE author_requests
            SET status = 'rejected', admin_notes = $1, reviewed_by = $2, updated_at = NOW()
          WHERE id = $3 AND status = 'pending'
          RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(&reason)
    .bind(admin_id)
    .bind(request_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to reject author request", e))?
    .ok_or_else(|| ApiError::not_found("Author request not found or not pending"))?;

    // Compensating notification only; nothing was materialized.
    if let Err(e) =
        notification::notify_request_rejected(&pool, rejected.user_id, rejected.id, &reason).await
    {
        warn!("Failed to create rejection notification for request {}: {e}", rejected.id);
    }
    match requester_email(&pool, rejected.user_id).await {
        Ok(Some(address)) => {
            if let Err(e) =
                email::send_author_rejection(&address, &rejected.first_name, &reason).await
            {
                warn!("Failed to send rejection email for request {}: {e}", rejected.id);
            }
        }
        Ok(None) => warn!(
            "No email on file for user {}, skipping rejection email",
            rejected.user_id
        ),
        Err(e) => warn!("Failed to load requester email: {e}"),
    }

    info!("Author request {} rejected by admin {admin_id}", rejected.id);
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author request rejected",
        json!({ "request_id": rejected.id }),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(approve_author_request, reject_author_request),
    components(schemas(ApprovePayload, RejectPayload, ApprovalOutcome)),
    tags(
        (name = "Review", description = "Admin review of author requests")
    )
)]
pub struct ReviewDoc;
