use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use super::types::*;

const COLUMNS: &str = "id, association_id, title, body, link, priority, status, expires_at, \
                       view_count, click_count, created_by, created_at";

/// All notifications of an association, newest first.
pub async fn find_all_for_association(pool: &PgPool, association_id: &str) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE association_id = $1 ORDER BY created_at DESC"
    ))
    .bind(association_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Notifications awaiting approval, across all associations, oldest first.
pub async fn find_pending(pool: &PgPool) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE status = $1 ORDER BY created_at ASC"
    ))
    .bind(NotificationStatus::Pending.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Approved notifications that have not expired yet.
pub async fn find_active(pool: &PgPool) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications \
         WHERE status = $1 AND expires_at > now() \
         ORDER BY priority = 'high' DESC, created_at DESC"
    ))
    .bind(NotificationStatus::Approved.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Notification>, AppError> {
    let row = sqlx::query_as::<_, Notification>(&format!("SELECT {COLUMNS} FROM notifications WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a notification and return the stored row.
pub async fn create(pool: &PgPool, new: &NewNotification) -> Result<Notification, AppError> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications \
             (association_id, title, body, link, priority, status, expires_at, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {COLUMNS}"
    ))
    .bind(&new.association_id)
    .bind(&new.title)
    .bind(&new.body)
    .bind(&new.link)
    .bind(new.priority.as_str())
    .bind(new.status.as_str())
    .bind(new.expires_at)
    .bind(&new.created_by)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Delete a notification. `association_id = None` deletes regardless of owner.
/// Returns false when nothing matched.
pub async fn delete(pool: &PgPool, id: Uuid, association_id: Option<&str>) -> Result<bool, AppError> {
    let result = match association_id {
        Some(aid) => {
            sqlx::query("DELETE FROM notifications WHERE id = $1 AND association_id = $2")
                .bind(id)
                .bind(aid)
                .execute(pool)
                .await?
        }
        None => {
            sqlx::query("DELETE FROM notifications WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

/// Move a pending notification to `status`. Returns false if it was not pending.
pub async fn set_status(pool: &PgPool, id: Uuid, status: NotificationStatus) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE notifications SET status = $1 WHERE id = $2 AND status = $3")
        .bind(status.as_str())
        .bind(id)
        .bind(NotificationStatus::Pending.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE notifications SET view_count = view_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn increment_clicks(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE notifications SET click_count = click_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
