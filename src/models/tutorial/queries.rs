use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use super::types::*;

const SLIDE_COLUMNS: &str = "id, tutorial_id, sort_order, layout, image_url";

/// List an association's tutorials, newest first, with slide counts.
pub async fn find_all_for_association(pool: &PgPool, association_id: &str) -> Result<Vec<TutorialListItem>, AppError> {
    let items = sqlx::query_as::<_, TutorialListItem>(
        "SELECT t.id, t.title, t.description, t.is_published, t.created_at, \
                COUNT(s.id) AS slide_count \
         FROM tutorials t \
         LEFT JOIN tutorial_slides s ON s.tutorial_id = t.id \
         WHERE t.association_id = $1 \
         GROUP BY t.id \
         ORDER BY t.created_at DESC",
    )
    .bind(association_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Find a tutorial, scoped to the owning association.
pub async fn find_by_id(pool: &PgPool, id: Uuid, association_id: &str) -> Result<Option<Tutorial>, AppError> {
    let tutorial = sqlx::query_as::<_, Tutorial>(
        "SELECT id, association_id, title, description, is_published, created_by, created_at, updated_at \
         FROM tutorials WHERE id = $1 AND association_id = $2",
    )
    .bind(id)
    .bind(association_id)
    .fetch_optional(pool)
    .await?;
    Ok(tutorial)
}

/// Slides of a tutorial ordered by position.
pub async fn find_slides(pool: &PgPool, tutorial_id: Uuid) -> Result<Vec<PersistedSlide>, sqlx::Error> {
    sqlx::query_as::<_, PersistedSlide>(&format!(
        "SELECT {SLIDE_COLUMNS} FROM tutorial_slides WHERE tutorial_id = $1 ORDER BY sort_order ASC"
    ))
    .bind(tutorial_id)
    .fetch_all(pool)
    .await
}

pub async fn find_detail(pool: &PgPool, id: Uuid, association_id: &str) -> Result<Option<TutorialDetail>, AppError> {
    let Some(tutorial) = find_by_id(pool, id, association_id).await? else {
        return Ok(None);
    };
    let slides = find_slides(pool, id).await?;
    Ok(Some(TutorialDetail { tutorial, slides }))
}

/// Insert a tutorial and return its id.
pub async fn create(pool: &PgPool, fields: &TutorialFields) -> Result<Uuid, AppError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO tutorials (association_id, title, description, is_published, created_by) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&fields.association_id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_published)
    .bind(&fields.created_by)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Update a tutorial's fields. Returns false when no row matched.
pub async fn update(pool: &PgPool, id: Uuid, fields: &TutorialFields) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE tutorials \
         SET title = $1, description = $2, is_published = $3, created_by = $4, updated_at = now() \
         WHERE id = $5 AND association_id = $6",
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_published)
    .bind(&fields.created_by)
    .bind(id)
    .bind(&fields.association_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn slide_refs(pool: &PgPool, tutorial_id: Uuid) -> Result<Vec<SlideRef>, sqlx::Error> {
    sqlx::query_as::<_, SlideRef>(
        "SELECT id, image_url FROM tutorial_slides WHERE tutorial_id = $1 ORDER BY sort_order ASC",
    )
    .bind(tutorial_id)
    .fetch_all(pool)
    .await
}

/// Insert slides in one statement.
pub async fn insert_slides(pool: &PgPool, rows: &[NewSlide]) -> Result<Vec<PersistedSlide>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tutorial_slides (tutorial_id, sort_order, layout, image_url) ");
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.tutorial_id)
            .push_bind(row.order)
            .push_bind(row.layout.as_str())
            .push_bind(row.image_url.clone());
    });
    qb.push(format!(" RETURNING {SLIDE_COLUMNS}"));
    qb.build_query_as::<PersistedSlide>().fetch_all(pool).await
}

/// Insert-or-update slides by id in one statement.
///
/// The conflict branch only fires for rows of the same tutorial, so an id
/// belonging to another tutorial is never moved.
pub async fn upsert_slides(pool: &PgPool, rows: &[PersistedSlide]) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tutorial_slides (id, tutorial_id, sort_order, layout, image_url) ");
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.id)
            .push_bind(row.tutorial_id)
            .push_bind(row.order)
            .push_bind(row.layout.clone())
            .push_bind(row.image_url.clone());
    });
    qb.push(
        " ON CONFLICT (id) DO UPDATE \
         SET sort_order = EXCLUDED.sort_order, layout = EXCLUDED.layout, image_url = EXCLUDED.image_url \
         WHERE tutorial_slides.tutorial_id = EXCLUDED.tutorial_id",
    );
    qb.build().execute(pool).await?;
    Ok(())
}

pub async fn delete_slides(pool: &PgPool, ids: &[Uuid]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query("DELETE FROM tutorial_slides WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a tutorial. Slides are removed by the foreign key cascade.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tutorials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
