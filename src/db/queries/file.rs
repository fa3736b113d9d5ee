// src/db/queries/file.rs
//
// Attachment ownership moves. The blob store itself is external; these
// queries only re-point the (content_kind, content_id) key.
use sqlx::{PgExecutor, PgPool};

use crate::db::models::file::{FileOwner, FileRecord};

/// Tag a set of uploaded files as belonging to an owner. Used at
/// submission time to claim loose uploads for the new request.
pub async fn claim_files<'e, E: PgExecutor<'e>>(
    executor: E,
    file_ids: &[i32],
    owner: FileOwner,
) -> Result<u64, sqlx::Error> {
    if file_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        "UPDATE files SET content_kind = $1, content_id = $2 WHERE id = ANY($3)",
    )
    .bind(owner.kind)
    .bind(owner.id)
    .bind(file_ids)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Move every file currently attached to `from` onto `to`. Last write
/// wins when called repeatedly for the same source owner.
pub async fn retarget_files(
    pool: &PgPool,
    from: FileOwner,
    to: FileOwner,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE files SET content_kind = $1, content_id = $2
         WHERE content_kind = $3 AND content_id = $4",
    )
    .bind(to.kind)
    .bind(to.id)
    .bind(from.kind)
    .bind(from.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// All files currently attached to an owner.
pub async fn files_for_owner(
    pool: &PgPool,
    owner: FileOwner,
) -> Result<Vec<FileRecord>, sqlx::Error> {
    sqlx::query_as::<_, FileRecord>(
        "SELECT id, file_name, content_kind, content_id, version, uploaded_by, created_at
         FROM files
         WHERE content_kind = $1 AND content_id = $2
         ORDER BY id",
    )
    .bind(owner.kind)
    .bind(owner.id)
    .fetch_all(pool)
    .await
}
