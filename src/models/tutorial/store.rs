use sqlx::PgPool;
use uuid::Uuid;

use crate::storage::{SlideStore, StoreError};
use super::queries;
use super::types::{NewSlide, PersistedSlide, SlideRef};

impl SlideStore for PgPool {
    async fn slide_refs(&self, tutorial_id: Uuid) -> Result<Vec<SlideRef>, StoreError> {
        Ok(queries::slide_refs(self, tutorial_id).await?)
    }

    async fn insert_slides(&self, rows: &[NewSlide]) -> Result<Vec<PersistedSlide>, StoreError> {
        Ok(queries::insert_slides(self, rows).await?)
    }

    async fn upsert_slides(&self, rows: &[PersistedSlide]) -> Result<(), StoreError> {
        Ok(queries::upsert_slides(self, rows).await?)
    }

    async fn delete_slides(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        Ok(queries::delete_slides(self, ids).await?)
    }

    async fn delete_parent(&self, tutorial_id: Uuid) -> Result<(), StoreError> {
        Ok(queries::delete(self, tutorial_id).await?)
    }
}
