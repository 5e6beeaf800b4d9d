use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit;
use crate::config::AppConfig;
use crate::context::SessionContext;
use crate::errors::AppError;
use crate::models::notification::{self, NewNotification, NotificationRequest, NotificationStatus, NotificationView, PublicNotification};

fn views(rows: Vec<notification::Notification>) -> Vec<NotificationView> {
    let now = Utc::now();
    rows.into_iter().map(|n| NotificationView::at(n, now)).collect()
}

/// GET /api/notifications - the operator's association, newest first
pub async fn list(pool: web::Data<PgPool>, ctx: SessionContext) -> Result<HttpResponse, AppError> {
    let rows = notification::find_all_for_association(&pool, &ctx.association_id).await?;
    Ok(HttpResponse::Ok().json(views(rows)))
}

/// POST /api/notifications
pub async fn create(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    ctx: SessionContext,
    body: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let new = NewNotification::from_request(
        &body,
        &ctx.association_id,
        &ctx.email,
        config.notifications_require_approval,
        Utc::now().date_naive(),
    )
    .map_err(AppError::Validation)?;

    let created = notification::create(&pool, &new).await?;

    audit::log(
        &pool,
        &ctx,
        "notification.created",
        "notification",
        &created.id.to_string(),
        serde_json::json!({ "title": created.title, "status": created.status }),
    )
    .await;

    Ok(HttpResponse::Created().json(NotificationView::at(created, Utc::now())))
}

/// DELETE /api/notifications/{id} - superadmins may delete any association's
pub async fn delete(
    pool: web::Data<PgPool>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let scope = (!ctx.is_superadmin).then_some(ctx.association_id.as_str());

    if !notification::delete(&pool, id, scope).await? {
        return Err(AppError::NotFound);
    }

    audit::log(&pool, &ctx, "notification.deleted", "notification", &id.to_string(), serde_json::json!({})).await;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/notifications/pending (superadmin)
pub async fn pending(pool: web::Data<PgPool>, ctx: SessionContext) -> Result<HttpResponse, AppError> {
    ctx.require_superadmin()?;
    let rows = notification::find_pending(&pool).await?;
    Ok(HttpResponse::Ok().json(views(rows)))
}

async fn moderate(
    pool: &PgPool,
    ctx: &SessionContext,
    id: Uuid,
    status: NotificationStatus,
) -> Result<HttpResponse, AppError> {
    ctx.require_superadmin()?;

    if !notification::set_status(pool, id, status).await? {
        // Either missing or already moderated
        return match notification::find_by_id(pool, id).await? {
            Some(n) => Err(AppError::Conflict(format!("Notification is already {}", n.status))),
            None => Err(AppError::NotFound),
        };
    }

    let action = format!("notification.{}", status.as_str());
    audit::log(pool, ctx, &action, "notification", &id.to_string(), serde_json::json!({})).await;

    let updated = notification::find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(NotificationView::at(updated, Utc::now())))
}

/// POST /api/notifications/{id}/approve (superadmin)
pub async fn approve(
    pool: web::Data<PgPool>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    moderate(&pool, &ctx, path.into_inner(), NotificationStatus::Approved).await
}

/// POST /api/notifications/{id}/reject (superadmin)
pub async fn reject(
    pool: web::Data<PgPool>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    moderate(&pool, &ctx, path.into_inner(), NotificationStatus::Rejected).await
}

/// GET /api/public/notifications - approved and unexpired, high priority first
pub async fn public_list(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let rows: Vec<PublicNotification> = notification::find_active(&pool)
        .await?
        .into_iter()
        .map(PublicNotification::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/public/notifications/{id}/view
pub async fn record_view(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
    if !notification::increment_views(&pool, path.into_inner()).await? {
        return Err(AppError::NotFound);
    }
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/public/notifications/{id}/click
pub async fn record_click(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
    if !notification::increment_clicks(&pool, path.into_inner()).await? {
        return Err(AppError::NotFound);
    }
    Ok(HttpResponse::NoContent().finish())
}
