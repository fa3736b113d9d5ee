use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;

use crate::api::auth::Claims;
use crate::db::models::author_request::{
    AuthorRequest, AuthorRequestDetail, ListRequestParams, NewAuthorRequest, NewRequestedArticle,
    NewRequestedBook, NewRequestedInstitution, NewRequestedJournal, RequestPage, RequestStatus,
    RequestedArticle, RequestedBook, RequestedInstitution, RequestedJournal, UpdateAuthorRequest,
};
use crate::db::models::file::FileOwner;
use crate::db::queries::file::{claim_files, files_for_owner};
use crate::middleware::auth::UserPermissions;
use crate::utils::api_response::ApiResponse;
use crate::utils::email;
use crate::utils::error::ApiError;
use crate::utils::notification;

pub(crate) const REQUEST_COLUMNS: &str = "id, user_id, academic_title, first_name, last_name, bio, \
     reason_for_request, status, admin_notes, reviewed_by, created_at, updated_at";

//
// Shared lookups
//

pub async fn get_request_by_id(pool: &PgPool, request_id: i32) -> Result<AuthorRequest, ApiError> {
    sqlx::query_as::<_, AuthorRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM author_requests WHERE id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to look up author request", e))?
    .ok_or_else(|| ApiError::not_found("Author request not found"))
}

/// Claimed-work rows for one request, in insertion order.
pub async fn load_children(
    pool: &PgPool,
    request_id: i32,
) -> Result<
    (
        Vec<RequestedArticle>,
        Vec<RequestedJournal>,
        Vec<RequestedBook>,
        Vec<RequestedInstitution>,
    ),
    sqlx::Error,
> {
    let articles = sqlx::query_as::<_, RequestedArticle>(
        "SELECT id, request_id, title, subtitle, abstract, language, doi, published_on, publisher
         FROM author_request_articles WHERE request_id = $1 ORDER BY id",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    let journals = sqlx::query_as::<_, RequestedJournal>(
        "SELECT id, request_id, title, issn, publisher, language, website
         FROM author_request_journals WHERE request_id = $1 ORDER BY id",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    let books = sqlx::query_as::<_, RequestedBook>(
        "SELECT id, request_id, title, isbn, publisher, language, published_on
         FROM author_request_books WHERE request_id = $1 ORDER BY id",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    let institutions = sqlx::query_as::<_, RequestedInstitution>(
        "SELECT id, request_id, name, country, city, website
         FROM author_request_institutions WHERE request_id = $1 ORDER BY id",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    Ok((articles, journals, books, institutions))
}

async fn load_detail(pool: &PgPool, request: AuthorRequest) -> Result<AuthorRequestDetail, ApiError> {
    let (articles, journals, books, institutions) = load_children(pool, request.id)
        .await
        .map_err(|e| ApiError::dependency("Failed to load claimed works", e))?;
    let files = files_for_owner(pool, FileOwner::request(request.id))
        .await
        .map_err(|e| ApiError::dependency("Failed to load attached files", e))?;
    Ok(AuthorRequestDetail {
        request,
        articles,
        journals,
        books,
        institutions,
        files,
    })
}

/// Owner-mutation precondition: request exists, caller may touch it, and
/// it is still pending.
async fn fetch_pending_owned(
    pool: &PgPool,
    request_id: i32,
    perms: &UserPermissions,
) -> Result<AuthorRequest, ApiError> {
    let request = get_request_by_id(pool, request_id).await?;
    perms.require_owner_or_admin(request.user_id)?;
    if request.status != RequestStatus::Pending {
        return Err(ApiError::not_found("Author request is no longer pending"));
    }
    Ok(request)
}

async fn admin_emails(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT email FROM users WHERE role = 'admin' AND email IS NOT NULL")
        .fetch_all(pool)
        .await
}

//
// Submission
//

#[utoipa::path(
    post,
    path = "/author-requests",
    request_body = NewAuthorRequest,
    responses(
        (status = 201, description = "Author request submitted", body = AuthorRequestDetail),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Duplicate request or role already granted"),
        (status = 500, description = "Failed to persist the request")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn create_author_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(perms): Extension<UserPermissions>,
    Json(payload): Json<NewAuthorRequest>,
) -> Result<ApiResponse<AuthorRequestDetail>, ApiError> {
    let user_id = claims.user_id()?;

    payload.validate().map_err(ApiError::validation)?;

    if !perms.role.may_request_authorship() {
        return Err(ApiError::conflict(
            "Your account already has author privileges",
        ));
    }

    // One live request per user: pending and approved both block.
    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM author_requests
            WHERE user_id = $1 AND status IN ('pending', 'approved')
        )",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to check for existing requests", e))?;

    if duplicate {
        return Err(ApiError::conflict(
            "You already have an author request pending or approved",
        ));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiError::dependency("Failed to start transaction", e))?;

    let request = sqlx::query_as::<_, AuthorRequest>(&format!(
        "INSERT INTO author_requests
            (user_id, academic_title, first_name, last_name, bio, reason_for_request)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&payload.academic_title)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.bio)
    .bind(&payload.reason_for_request)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiError::dependency("Failed to insert author request", e))?;

    for article in &payload.articles {
        sqlx::query(
            "INSERT INTO author_request_articles
                (request_id, title, subtitle, abstract, language, doi, published_on, publisher)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(request.id)
        .bind(&article.title)
        .bind(&article.subtitle)
        .bind(&article.abstract_text)
        .bind(&article.language)
        .bind(&article.doi)
        .bind(article.published_on)
        .bind(&article.publisher)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::dependency("Failed to insert claimed article", e))?;
    }

    for journal in &payload.journals {
        sqlx::query(
            "INSERT INTO author_request_journals
                (request_id, title, issn, publisher, language, website)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(request.id)
        .bind(&journal.title)
        .bind(&journal.issn)
        .bind(&journal.publisher)
        .bind(&journal.language)
        .bind(&journal.website)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::dependency("Failed to insert claimed journal", e))?;
    }

    for book in &payload.books {
        sqlx::query(
            "INSERT INTO author_request_books
                (request_id, title, isbn, publisher, language, published_on)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(request.id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(&book.language)
        .bind(book.published_on)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::dependency("Failed to insert claimed book", e))?;
    }

    for institution in &payload.institutions {
        sqlx::query(
            "INSERT INTO author_request_institutions
                (request_id, name, country, city, website)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(request.id)
        .bind(&institution.name)
        .bind(&institution.country)
        .bind(&institution.city)
        .bind(&institution.website)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::dependency("Failed to insert claimed institution", e))?;
    }

    claim_files(&mut *tx, &payload.file_ids, FileOwner::request(request.id))
        .await
        .map_err(|e| ApiError::dependency("Failed to attach uploaded files", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiError::dependency("Failed to commit transaction", e))?;

    // Best-effort admin broadcast; a notification failure never fails the
    // submission.
    let requester_name = format!("{} {}", request.first_name, request.last_name);
    if let Err(e) = notification::notify_admins_new_request(&pool, &requester_name, request.id).await
    {
        warn!("Failed to create admin notification for request {}: {e}", request.id);
    }
    match admin_emails(&pool).await {
        Ok(emails) => {
            if let Err(e) =
                email::send_admin_request_alert(&emails, &requester_name, request.id).await
            {
                warn!("Failed to email admins about request {}: {e}", request.id);
            }
        }
        Err(e) => warn!("Failed to load admin emails: {e}"),
    }

    let detail = load_detail(&pool, request).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Author request submitted",
        detail,
    ))
}

//
// State queries
//

#[utoipa::path(
    get,
    path = "/author-requests",
    params(ListRequestParams),
    responses(
        (status = 200, description = "Paginated author requests", body = RequestPage),
        (status = 403, description = "Admin role required")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_author_requests(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Query(params): Query<ListRequestParams>,
) -> Result<ApiResponse<RequestPage>, ApiError> {
    perms.require_admin()?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let sort_column = match params.sort.as_deref() {
        Some("updated_at") => "updated_at",
        Some("status") => "status",
        _ => "created_at",
    };

    let mut query =
        QueryBuilder::<Postgres>::new(format!("SELECT {REQUEST_COLUMNS} FROM author_requests WHERE TRUE"));
    let mut count_query =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM author_requests WHERE TRUE");

    if let Some(status) = params.status {
        query.push(" AND status = ").push_bind(status);
        count_query.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query
            .push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(")");
        count_query
            .push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query
        .push(format!(" ORDER BY {sort_column} DESC LIMIT "))
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind((page - 1) * limit);

    let items = query
        .build_query_as::<AuthorRequest>()
        .fetch_all(&pool)
        .await
        .map_err(|e| ApiError::dependency("Failed to list author requests", e))?;

    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&pool)
        .await
        .map_err(|e| ApiError::dependency("Failed to count author requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author requests retrieved",
        RequestPage {
            items,
            total,
            page,
            limit,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/author-requests/me",
    responses(
        (status = 200, description = "Latest own request, or null", body = AuthorRequestDetail),
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_my_author_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Option<AuthorRequestDetail>>, ApiError> {
    let user_id = claims.user_id()?;

    let request = sqlx::query_as::<_, AuthorRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM author_requests
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to look up author request", e))?;

    let detail = match request {
        Some(request) => Some(load_detail(&pool, request).await?),
        None => None,
    };

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Latest author request",
        detail,
    ))
}

#[utoipa::path(
    get,
    path = "/author-requests/{id}",
    params(("id" = i32, Path, description = "Author request ID")),
    responses(
        (status = 200, description = "Full request graph", body = AuthorRequestDetail),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Author request not found")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_author_request(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
) -> Result<ApiResponse<AuthorRequestDetail>, ApiError> {
    let request = get_request_by_id(&pool, request_id).await?;
    perms.require_owner_or_admin(request.user_id)?;

    let detail = load_detail(&pool, request).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author request retrieved",
        detail,
    ))
}

//
// Owner mutations (pending requests only)
//

#[utoipa::path(
    put,
    path = "/author-requests/{id}",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = UpdateAuthorRequest,
    responses(
        (status = 200, description = "Author request updated", body = AuthorRequestDetail),
        (status = 400, description = "No fields provided for update"),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_author_request(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<UpdateAuthorRequest>,
) -> Result<ApiResponse<AuthorRequestDetail>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    if payload.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    // Status re-checked in the WHERE clause so a concurrent review wins.
    let updated = sqlx::query_as::<_, AuthorRequest>(&format!(
        "UPDATE author_requests
            SET academic_title = COALESCE($1, academic_title),
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                bio = COALESCE($4, bio),
                reason_for_request = COALESCE($5, reason_for_request),
                updated_at = NOW()
          WHERE id = $6 AND status = 'pending'
          RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(&payload.academic_title)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.bio)
    .bind(&payload.reason_for_request)
    .bind(request_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to update author request", e))?
    .ok_or_else(|| ApiError::not_found("Author request is no longer pending"))?;

    let detail = load_detail(&pool, updated).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author request updated",
        detail,
    ))
}

#[utoipa::path(
    delete,
    path = "/author-requests/{id}",
    params(("id" = i32, Path, description = "Author request ID")),
    responses(
        (status = 200, description = "Author request deleted"),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn delete_author_request(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiError::dependency("Failed to start transaction", e))?;

    for table in [
        "author_request_articles",
        "author_request_journals",
        "author_request_books",
        "author_request_institutions",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE request_id = $1"))
            .bind(request_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::dependency("Failed to delete claimed works", e))?;
    }

    let deleted = sqlx::query("DELETE FROM author_requests WHERE id = $1 AND status = 'pending'")
        .bind(request_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::dependency("Failed to delete author request", e))?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Author request is no longer pending"));
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::dependency("Failed to commit transaction", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Author request deleted",
        (),
    ))
}

//
// Claimed work items on a pending request
//

#[utoipa::path(
    post,
    path = "/author-requests/{id}/articles",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = NewRequestedArticle,
    responses(
        (status = 201, description = "Claimed article added", body = RequestedArticle),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn add_requested_article(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<NewRequestedArticle>,
) -> Result<ApiResponse<RequestedArticle>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Article title is required"));
    }

    let article = sqlx::query_as::<_, RequestedArticle>(
        "INSERT INTO author_request_articles
            (request_id, title, subtitle, abstract, language, doi, published_on, publisher)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, request_id, title, subtitle, abstract, language, doi, published_on, publisher",
    )
    .bind(request_id)
    .bind(&payload.title)
    .bind(&payload.subtitle)
    .bind(&payload.abstract_text)
    .bind(&payload.language)
    .bind(&payload.doi)
    .bind(payload.published_on)
    .bind(&payload.publisher)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to add claimed article", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Claimed article added",
        article,
    ))
}

#[utoipa::path(
    delete,
    path = "/author-requests/{id}/articles/{item_id}",
    params(
        ("id" = i32, Path, description = "Author request ID"),
        ("item_id" = i32, Path, description = "Claimed article ID")
    ),
    responses(
        (status = 200, description = "Claimed article removed"),
        (status = 404, description = "Not found")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn remove_requested_article(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path((request_id, item_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    let deleted =
        sqlx::query("DELETE FROM author_request_articles WHERE id = $1 AND request_id = $2")
            .bind(item_id)
            .bind(request_id)
            .execute(&pool)
            .await
            .map_err(|e| ApiError::dependency("Failed to remove claimed article", e))?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Claimed article not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Claimed article removed",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/author-requests/{id}/journals",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = NewRequestedJournal,
    responses(
        (status = 201, description = "Claimed journal added", body = RequestedJournal),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn add_requested_journal(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<NewRequestedJournal>,
) -> Result<ApiResponse<RequestedJournal>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Journal title is required"));
    }

    let journal = sqlx::query_as::<_, RequestedJournal>(
        "INSERT INTO author_request_journals
            (request_id, title, issn, publisher, language, website)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, request_id, title, issn, publisher, language, website",
    )
    .bind(request_id)
    .bind(&payload.title)
    .bind(&payload.issn)
    .bind(&payload.publisher)
    .bind(&payload.language)
    .bind(&payload.website)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to add claimed journal", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Claimed journal added",
        journal,
    ))
}

#[utoipa::path(
    delete,
    path = "/author-requests/{id}/journals/{item_id}",
    params(
        ("id" = i32, Path, description = "Author request ID"),
        ("item_id" = i32, Path, description = "Claimed journal ID")
    ),
    responses(
        (status = 200, description = "Claimed journal removed"),
        (status = 404, description = "Not found")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn remove_requested_journal(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path((request_id, item_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    let deleted =
        sqlx::query("DELETE FROM author_request_journals WHERE id = $1 AND request_id = $2")
            .bind(item_id)
            .bind(request_id)
            .execute(&pool)
            .await
            .map_err(|e| ApiError::dependency("Failed to remove claimed journal", e))?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Claimed journal not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Claimed journal removed",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/author-requests/{id}/books",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = NewRequestedBook,
    responses(
        (status = 201, description = "Claimed book added", body = RequestedBook),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn add_requested_book(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<NewRequestedBook>,
) -> Result<ApiResponse<RequestedBook>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Book title is required"));
    }

    let book = sqlx::query_as::<_, RequestedBook>(
        "INSERT INTO author_request_books
            (request_id, title, isbn, publisher, language, published_on)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, request_id, title, isbn, publisher, language, published_on",
    )
    .bind(request_id)
    .bind(&payload.title)
    .bind(&payload.isbn)
    .bind(&payload.publisher)
    .bind(&payload.language)
    .bind(payload.published_on)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to add claimed book", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Claimed book added",
        book,
    ))
}

#[utoipa::path(
    delete,
    path = "/author-requests/{id}/books/{item_id}",
    params(
        ("id" = i32, Path, description = "Author request ID"),
        ("item_id" = i32, Path, description = "Claimed book ID")
    ),
    responses(
        (status = 200, description = "Claimed book removed"),
        (status = 404, description = "Not found")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn remove_requested_book(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path((request_id, item_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    let deleted = sqlx::query("DELETE FROM author_request_books WHERE id = $1 AND request_id = $2")
        .bind(item_id)
        .bind(request_id)
        .execute(&pool)
        .await
        .map_err(|e| ApiError::dependency("Failed to remove claimed book", e))?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Claimed book not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Claimed book removed",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/author-requests/{id}/institutions",
    params(("id" = i32, Path, description = "Author request ID")),
    request_body = NewRequestedInstitution,
    responses(
        (status = 201, description = "Claimed institution added", body = RequestedInstitution),
        (status = 404, description = "Not found or no longer pending")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn add_requested_institution(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path(request_id): Path<i32>,
    Json(payload): Json<NewRequestedInstitution>,
) -> Result<ApiResponse<RequestedInstitution>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Institution name is required"));
    }

    let institution = sqlx::query_as::<_, RequestedInstitution>(
        "INSERT INTO author_request_institutions
            (request_id, name, country, city, website)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, request_id, name, country, city, website",
    )
    .bind(request_id)
    .bind(&payload.name)
    .bind(&payload.country)
    .bind(&payload.city)
    .bind(&payload.website)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiError::dependency("Failed to add claimed institution", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Claimed institution added",
        institution,
    ))
}

#[utoipa::path(
    delete,
    path = "/author-requests/{id}/institutions/{item_id}",
    params(
        ("id" = i32, Path, description = "Author request ID"),
        ("item_id" = i32, Path, description = "Claimed institution ID")
    ),
    responses(
        (status = 200, description = "Claimed institution removed"),
        (status = 404, description = "Not found")
    ),
    tag = "Author Requests",
    security(("bearerAuth" = []))
)]
pub async fn remove_requested_institution(
    State(pool): State<PgPool>,
    Extension(perms): Extension<UserPermissions>,
    Path((request_id, item_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, ApiError> {
    fetch_pending_owned(&pool, request_id, &perms).await?;

    let deleted =
        sqlx::query("DELETE FROM author_request_institutions WHERE id = $1 AND request_id = $2")
            .bind(item_id)
            .bind(request_id)
            .execute(&pool)
            .await
            .map_err(|e| ApiError::dependency("Failed to remove claimed institution", e))?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Claimed institution not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Claimed institution removed",
        (),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_author_request,
        get_author_requests,
        get_my_author_request,
        get_author_request,
        update_author_request,
        delete_author_request,
        add_requested_article,
        remove_requested_article,
        add_requested_journal,
        remove_requested_journal,
        add_requested_book,
        remove_requested_book,
        add_requested_institution,
        remove_requested_institution
    ),
    components(schemas(
        AuthorRequest,
        AuthorRequestDetail,
        NewAuthorRequest,
        UpdateAuthorRequest,
        RequestStatus,
        RequestPage,
        RequestedArticle,
        RequestedJournal,
        RequestedBook,
        RequestedInstitution,
        NewRequestedArticle,
        NewRequestedJournal,
        NewRequestedBook,
        NewRequestedInstitution
    )),
    tags(
        (name = "Author Requests", description = "Author promotion request endpoints")
    )
)]
pub struct AuthorRequestDoc;
