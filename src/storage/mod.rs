//! Persistence seam used by the slide reconciler.
//!
//! The reconciler only talks to a [`SlideStore`] (table rows) and a
//! [`BlobStore`] (object bucket). Production wires them to Postgres and the
//! local filesystem; tests use an in-memory fake.

pub mod local;

use std::future::Future;

use uuid::Uuid;

use crate::models::tutorial::{NewSlide, PersistedSlide, SlideRef};

/// Path segment preceding the bucket name in every public object URL.
pub const PUBLIC_OBJECT_PREFIX: &str = "storage/v1/object/public";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("object '{0}' already exists")]
    AlreadyExists(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions<'a> {
    pub content_type: &'a str,
    pub overwrite: bool,
}

/// Row-level operations on the slides of one tutorial.
pub trait SlideStore {
    /// Ids and image URLs of every slide currently stored for `tutorial_id`.
    fn slide_refs(&self, tutorial_id: Uuid) -> impl Future<Output = Result<Vec<SlideRef>, StoreError>> + Send;

    fn insert_slides(&self, rows: &[NewSlide]) -> impl Future<Output = Result<Vec<PersistedSlide>, StoreError>> + Send;

    /// Insert-or-update by id. A row owned by another tutorial is left untouched.
    fn upsert_slides(&self, rows: &[PersistedSlide]) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_slides(&self, ids: &[Uuid]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the tutorial row itself; its slides go with it.
    fn delete_parent(&self, tutorial_id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A single object-storage bucket.
pub trait BlobStore {
    fn bucket(&self) -> &str;

    fn upload(
        &self,
        key: &str,
        data: &[u8],
        options: UploadOptions<'_>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn public_url(&self, key: &str) -> String;

    /// Remove objects by key. Missing objects are not an error.
    fn remove(&self, keys: &[String]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Storage key for a slide image: `<tutorial>/slide-<position>-<millis>.<ext>`.
///
/// `position` is 1-based. The timestamp keeps repeated saves from colliding
/// with cached copies of an earlier upload.
pub fn slide_key(tutorial_id: Uuid, position: usize, saved_at_millis: i64, extension: &str) -> String {
    format!("{tutorial_id}/slide-{position}-{saved_at_millis}.{extension}")
}

/// Build the public URL of `key` in `bucket` under `base_url`.
pub fn public_object_url(base_url: &str, bucket: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        PUBLIC_OBJECT_PREFIX,
        bucket,
        encoded.join("/")
    )
}

/// Recover a storage key from a public object URL.
///
/// Splits the URL path on `<bucket>/` and percent-decodes everything after
/// it. Returns `None` for unparseable URLs or URLs outside the bucket.
pub fn key_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let marker = format!("{bucket}/");
    let (_, rest) = parsed.path().split_once(marker.as_str())?;
    if rest.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(rest).ok()?;
    Some(decoded.into_owned())
}

/// Like [`key_from_public_url`], but only for keys under `<tutorial_id>/`.
pub fn tutorial_key_from_url(url: &str, bucket: &str, tutorial_id: Uuid) -> Option<String> {
    let prefix = format!("{tutorial_id}/");
    key_from_public_url(url, bucket).filter(|key| key.starts_with(&prefix))
}

/// Reject keys that could escape the bucket directory.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
