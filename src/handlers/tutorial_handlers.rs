use actix_web::{HttpResponse, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit;
use crate::auth::validate;
use crate::config::AppConfig;
use crate::context::SessionContext;
use crate::errors::AppError;
use crate::images::{self, NormalizeOptions, RawImage};
use crate::models::tutorial::{self, SlideImageInput, SlideInput, TutorialFields, TutorialSaveRequest};
use crate::slides::{
    ImageRef, ReconcileReport, SaveGuard, SaveLocks, SlideEdit, SlideList, SlideSetReconciler, purge_tutorial,
};
use crate::storage::local::LocalBlobStore;

const TITLE_MAX_LEN: usize = 200;
const DESCRIPTION_MAX_LEN: usize = 2000;
const DEFAULT_UPLOAD_NAME: &str = "slide";

/// Decode a base64 payload, with or without a `data:...;base64,` prefix.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, AppError> {
    let payload = match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 image data: {e}")))
}

fn validate_fields(body: &TutorialSaveRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", TITLE_MAX_LEN));
    if let Some(description) = &body.description {
        errors.extend(validate::validate_optional(description, "Description", DESCRIPTION_MAX_LEN));
    }
    if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
}

fn fields_for(ctx: &SessionContext, body: &TutorialSaveRequest) -> TutorialFields {
    TutorialFields {
        association_id: ctx.association_id.clone(),
        title: body.title.trim().to_string(),
        description: body
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from),
        is_published: body.is_published,
        created_by: ctx.email.clone(),
    }
}

/// Turn one submitted slide into an edit, normalizing a new upload on the
/// blocking pool.
async fn to_edit(input: SlideInput, options: NormalizeOptions) -> Result<SlideEdit, AppError> {
    let image = match input.image {
        None => None,
        Some(SlideImageInput::Persisted { url }) => Some(ImageRef::Persisted(url)),
        Some(SlideImageInput::Upload { data, content_type, file_name }) => {
            let raw = RawImage {
                file_name: file_name.unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string()),
                content_type,
                bytes: decode_base64_image(&data)?,
            };
            let normalized = web::block(move || images::normalize(&raw, &options)).await??;
            Some(ImageRef::Pending(normalized))
        }
    };
    Ok(SlideEdit {
        id: input.id,
        layout: input.layout,
        image,
    })
}

fn claim(locks: &SaveLocks, tutorial_id: Uuid) -> Result<SaveGuard, AppError> {
    locks
        .try_acquire(tutorial_id)
        .ok_or_else(|| AppError::Conflict("This tutorial is already being saved".to_string()))
}

/// Turn the submitted slides into an edit list, normalizing every upload.
///
/// Runs before anything is written so a bad upload rejects the whole save.
pub async fn prepare_slides(slides: Vec<SlideInput>, options: NormalizeOptions) -> Result<SlideList, AppError> {
    let edits = try_join_all(slides.into_iter().map(|input| to_edit(input, options))).await?;
    Ok(edits.into_iter().collect())
}

/// Reconcile the slides of `tutorial_id`. The caller holds the tutorial's
/// save guard.
async fn save_slides(
    pool: &PgPool,
    blobs: &LocalBlobStore,
    config: &AppConfig,
    tutorial_id: Uuid,
    slides: &SlideList,
) -> Result<ReconcileReport, AppError> {
    let report = SlideSetReconciler::new(pool, blobs)
        .with_options(config.reconcile_options())
        .reconcile(tutorial_id, slides.as_slice())
        .await?;
    Ok(report)
}

/// GET /api/tutorials
pub async fn list(pool: web::Data<PgPool>, ctx: SessionContext) -> Result<HttpResponse, AppError> {
    let items = tutorial::find_all_for_association(&pool, &ctx.association_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/tutorials/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let detail = tutorial::find_detail(&pool, path.into_inner(), &ctx.association_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /api/tutorials
pub async fn create(
    pool: web::Data<PgPool>,
    blobs: web::Data<LocalBlobStore>,
    config: web::Data<AppConfig>,
    locks: web::Data<SaveLocks>,
    ctx: SessionContext,
    body: web::Json<TutorialSaveRequest>,
) -> Result<HttpResponse, AppError> {
    validate_fields(&body)?;
    let mut body = body.into_inner();
    let slides = prepare_slides(std::mem::take(&mut body.slides), config.image).await?;

    let id = tutorial::create(&pool, &fields_for(&ctx, &body)).await?;
    let _guard = claim(&locks, id)?;
    let report = save_slides(&pool, &blobs, &config, id, &slides).await?;

    audit::log(
        &pool,
        &ctx,
        "tutorial.created",
        "tutorial",
        &id.to_string(),
        serde_json::json!({ "title": body.title, "slides": report.inserted.len() }),
    )
    .await;

    let detail = tutorial::find_detail(&pool, id, &ctx.association_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(detail))
}

/// PUT /api/tutorials/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    blobs: web::Data<LocalBlobStore>,
    config: web::Data<AppConfig>,
    locks: web::Data<SaveLocks>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
    body: web::Json<TutorialSaveRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    validate_fields(&body)?;
    let mut body = body.into_inner();

    if tutorial::find_by_id(&pool, id, &ctx.association_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let _guard = claim(&locks, id)?;
    let slides = prepare_slides(std::mem::take(&mut body.slides), config.image).await?;

    tutorial::update(&pool, id, &fields_for(&ctx, &body)).await?;
    let report = save_slides(&pool, &blobs, &config, id, &slides).await?;

    audit::log(
        &pool,
        &ctx,
        "tutorial.updated",
        "tutorial",
        &id.to_string(),
        serde_json::json!({
            "title": body.title,
            "inserted": report.inserted.len(),
            "updated": report.updated.len(),
            "deleted": report.deleted.len(),
            "pruned_images": report.pruned_keys.len(),
        }),
    )
    .await;

    let detail = tutorial::find_detail(&pool, id, &ctx.association_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}

/// DELETE /api/tutorials/{id} - removes slide images, then the tutorial
pub async fn delete(
    pool: web::Data<PgPool>,
    blobs: web::Data<LocalBlobStore>,
    locks: web::Data<SaveLocks>,
    ctx: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let tutorial = tutorial::find_by_id(&pool, id, &ctx.association_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let _guard = claim(&locks, id)?;

    let report = purge_tutorial(pool.get_ref(), blobs.get_ref(), id).await?;

    audit::log(
        &pool,
        &ctx,
        "tutorial.deleted",
        "tutorial",
        &id.to_string(),
        serde_json::json!({
            "title": tutorial.title,
            "removed_images": report.removed_keys.len(),
            "skipped_urls": report.skipped_urls,
        }),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}
