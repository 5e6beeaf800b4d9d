//! Shared test infrastructure.
//!
//! - `MemoryStore` - in-memory `SlideStore` + `BlobStore` that records every
//!   call, with failure injection for uploads and row mutations
//! - image fixtures for the normalizer

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use uuid::Uuid;

use spolky_admin::images::NormalizedImage;
use spolky_admin::models::tutorial::{NewSlide, PersistedSlide, SlideRef};
use spolky_admin::storage::{self, BlobStore, SlideStore, StoreError, UploadOptions};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const BUCKET: &str = "tutorial-images";
pub const BASE_URL: &str = "http://localhost:8080";
pub const SAVED_AT: i64 = 1_700_000_000_000;

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// One call made against the store, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Upload(String),
    SlideRefs(Uuid),
    Insert(usize),
    Upsert(Vec<Uuid>),
    Delete(Vec<Uuid>),
    DeleteParent(Uuid),
    Remove(Vec<String>),
}

/// Row mutation to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Insert,
    Upsert,
    Delete,
    Remove,
}

#[derive(Default)]
struct State {
    tutorials: HashSet<Uuid>,
    slides: Vec<PersistedSlide>,
    objects: BTreeMap<String, Vec<u8>>,
    ops: Vec<Op>,
    fail_uploads_containing: Option<String>,
    fail_at: Option<FailAt>,
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Create a tutorial holding slides with the given ids and image URLs,
    /// ordered as given.
    pub fn seed(&self, tutorial_id: Uuid, slides: &[(Uuid, Option<&str>)]) {
        let mut state = self.state.lock().unwrap();
        state.tutorials.insert(tutorial_id);
        for (idx, (id, url)) in slides.iter().enumerate() {
            state.slides.push(PersistedSlide {
                id: *id,
                tutorial_id,
                order: idx as i32 + 1,
                layout: "single".to_string(),
                image_url: url.map(String::from),
            });
        }
    }

    /// Store an object as if it had been uploaded earlier.
    pub fn put_object(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        state.objects.insert(key.to_string(), vec![0]);
    }

    pub fn fail_uploads_containing(&self, pattern: &str) {
        self.state.lock().unwrap().fail_uploads_containing = Some(pattern.to_string());
    }

    pub fn fail_at(&self, at: FailAt) {
        self.state.lock().unwrap().fail_at = Some(at);
    }

    pub fn slides_of(&self, tutorial_id: Uuid) -> Vec<PersistedSlide> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<PersistedSlide> = state
            .slides
            .iter()
            .filter(|s| s.tutorial_id == tutorial_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.order);
        rows
    }

    pub fn has_tutorial(&self, tutorial_id: Uuid) -> bool {
        self.state.lock().unwrap().tutorials.contains(&tutorial_id)
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Ops other than reads, for asserting what was written.
    pub fn mutations(&self) -> Vec<Op> {
        self.ops()
            .into_iter()
            .filter(|op| !matches!(op, Op::SlideRefs(_)))
            .collect()
    }

    pub fn url_for(&self, key: &str) -> String {
        storage::public_object_url(BASE_URL, BUCKET, key)
    }

    fn check(state: &State, at: FailAt) -> Result<(), StoreError> {
        if state.fail_at == Some(at) {
            return Err(StoreError::Rejected(format!("injected failure at {at:?}")));
        }
        Ok(())
    }
}

impl SlideStore for MemoryStore {
    async fn slide_refs(&self, tutorial_id: Uuid) -> Result<Vec<SlideRef>, StoreError> {
        self.state.lock().unwrap().ops.push(Op::SlideRefs(tutorial_id));
        Ok(self
            .slides_of(tutorial_id)
            .into_iter()
            .map(|s| SlideRef { id: s.id, image_url: s.image_url })
            .collect())
    }

    async fn insert_slides(&self, rows: &[NewSlide]) -> Result<Vec<PersistedSlide>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Insert(rows.len()));
        Self::check(&state, FailAt::Insert)?;
        let inserted: Vec<PersistedSlide> = rows
            .iter()
            .map(|row| PersistedSlide {
                id: Uuid::new_v4(),
                tutorial_id: row.tutorial_id,
                order: row.order,
                layout: row.layout.as_str().to_string(),
                image_url: row.image_url.clone(),
            })
            .collect();
        state.slides.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn upsert_slides(&self, rows: &[PersistedSlide]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Upsert(rows.iter().map(|r| r.id).collect()));
        Self::check(&state, FailAt::Upsert)?;
        for row in rows {
            match state.slides.iter().position(|s| s.id == row.id) {
                // Rows of another tutorial are left alone
                Some(idx) if state.slides[idx].tutorial_id == row.tutorial_id => state.slides[idx] = row.clone(),
                Some(_) => {}
                None => state.slides.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn delete_slides(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Delete(ids.to_vec()));
        Self::check(&state, FailAt::Delete)?;
        state.slides.retain(|s| !ids.contains(&s.id));
        Ok(())
    }

    async fn delete_parent(&self, tutorial_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::DeleteParent(tutorial_id));
        state.tutorials.remove(&tutorial_id);
        state.slides.retain(|s| s.tutorial_id != tutorial_id);
        Ok(())
    }
}

impl BlobStore for MemoryStore {
    fn bucket(&self) -> &str {
        BUCKET
    }

    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions<'_>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Upload(key.to_string()));
        if let Some(pattern) = &state.fail_uploads_containing {
            if key.contains(pattern.as_str()) {
                return Err(StoreError::Rejected(format!("upload of {key} refused")));
            }
        }
        if !options.overwrite && state.objects.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        state.objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.url_for(key)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Remove(keys.to_vec()));
        Self::check(&state, FailAt::Remove)?;
        for key in keys {
            state.objects.remove(key);
        }
        Ok(())
    }
}

// ============================================================================
// IMAGE FIXTURES
// ============================================================================

/// A solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 120, 200])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .expect("Failed to encode PNG fixture");
    buf
}

/// A pending image for reconciler tests; the bytes are never decoded.
pub fn pending_image(name: &str) -> NormalizedImage {
    NormalizedImage {
        file_name: format!("{name}.webp"),
        width: 10,
        height: 10,
        bytes: name.as_bytes().to_vec(),
    }
}
