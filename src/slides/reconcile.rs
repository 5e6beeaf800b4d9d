//! Differential save of a tutorial's slides.
//!
//! A save runs once through `UploadingImages → Diffing → Deleting →
//! Inserting → Updating → Done` (plus `PruningImages` when enabled). Any
//! stage may fail and abort the rest; earlier stages are not rolled back.

use std::collections::HashSet;
use std::fmt;

use futures::future::join_all;
use uuid::Uuid;

use crate::models::tutorial::{NewSlide, PersistedSlide, SlideRef};
use crate::storage::{BlobStore, SlideStore, StoreError, UploadOptions, slide_key, tutorial_key_from_url};
use super::{ImageRef, SlideEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    UploadingImages,
    Diffing,
    Deleting,
    Inserting,
    Updating,
    PruningImages,
    Done,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileStage::UploadingImages => "uploading images",
            ReconcileStage::Diffing => "diffing slides",
            ReconcileStage::Deleting => "deleting slides",
            ReconcileStage::Inserting => "inserting slides",
            ReconcileStage::Updating => "updating slides",
            ReconcileStage::PruningImages => "pruning images",
            ReconcileStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error("upload failed for slide {position}: {source}")]
    Upload { position: usize, source: StoreError },
    #[error("slide {id} appears more than once")]
    DuplicateSlide { id: Uuid },
    #[error("slide {id} does not belong to this tutorial")]
    UnknownSlide { id: Uuid },
    #[error("{stage} failed: {source}")]
    Store { stage: ReconcileStage, source: StoreError },
}

impl ReconcileError {
    /// Stage the save was in when it failed.
    pub fn stage(&self) -> ReconcileStage {
        match self {
            ReconcileError::Upload { .. } => ReconcileStage::UploadingImages,
            ReconcileError::DuplicateSlide { .. } | ReconcileError::UnknownSlide { .. } => ReconcileStage::Diffing,
            ReconcileError::Store { stage, .. } => *stage,
        }
    }
}

fn at(stage: ReconcileStage) -> impl FnOnce(StoreError) -> ReconcileError {
    move |source| ReconcileError::Store { stage, source }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Remove blobs of deleted or re-imaged slides once the rows are saved.
    pub prune_orphaned_images: bool,
}

/// Mutations needed to make the store mirror an edited list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlidePlan {
    pub deletes: Vec<Uuid>,
    pub inserts: Vec<NewSlide>,
    pub updates: Vec<PersistedSlide>,
}

impl SlidePlan {
    /// Diff `edits` against the stored `existing` slides.
    ///
    /// `image_urls[i]` is the resolved image of `edits[i]`. Every row gets
    /// `order = i + 1`, its position in the full list. An edit whose id is
    /// not among `existing` is refused.
    pub fn build(
        tutorial_id: Uuid,
        existing: &[SlideRef],
        edits: &[SlideEdit],
        image_urls: &[Option<String>],
    ) -> Result<Self, ReconcileError> {
        debug_assert_eq!(edits.len(), image_urls.len());

        let stored: HashSet<Uuid> = existing.iter().map(|slide| slide.id).collect();
        let mut kept: HashSet<Uuid> = HashSet::with_capacity(edits.len());
        let mut inserts = Vec::new();
        let mut updates = Vec::new();

        for (idx, (edit, image_url)) in edits.iter().zip(image_urls).enumerate() {
            let order = i32::try_from(idx + 1).unwrap_or(i32::MAX);
            match edit.id {
                Some(id) => {
                    if !kept.insert(id) {
                        return Err(ReconcileError::DuplicateSlide { id });
                    }
                    if !stored.contains(&id) {
                        return Err(ReconcileError::UnknownSlide { id });
                    }
                    updates.push(PersistedSlide {
                        id,
                        tutorial_id,
                        order,
                        layout: edit.layout.as_str().to_string(),
                        image_url: image_url.clone(),
                    });
                }
                None => inserts.push(NewSlide {
                    tutorial_id,
                    order,
                    layout: edit.layout,
                    image_url: image_url.clone(),
                }),
            }
        }

        let deletes = existing
            .iter()
            .map(|slide| slide.id)
            .filter(|id| !kept.contains(id))
            .collect();

        Ok(Self { deletes, inserts, updates })
    }

    /// Image URLs that no saved row references any more: those of deleted
    /// slides and the previous image of re-imaged slides.
    pub fn orphaned_urls(&self, existing: &[SlideRef]) -> Vec<String> {
        let referenced: HashSet<&str> = self
            .inserts
            .iter()
            .filter_map(|s| s.image_url.as_deref())
            .chain(self.updates.iter().filter_map(|s| s.image_url.as_deref()))
            .collect();

        let mut seen = HashSet::new();
        existing
            .iter()
            .filter_map(|slide| slide.image_url.as_deref())
            .filter(|url| !referenced.contains(url))
            .filter(|url| seen.insert(*url))
            .map(String::from)
            .collect()
    }
}

fn ensure_unique_ids(edits: &[SlideEdit]) -> Result<(), ReconcileError> {
    let mut seen = HashSet::with_capacity(edits.len());
    for id in edits.iter().filter_map(|edit| edit.id) {
        if !seen.insert(id) {
            return Err(ReconcileError::DuplicateSlide { id });
        }
    }
    Ok(())
}

/// Result of a successful save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub uploaded_keys: Vec<String>,
    pub deleted: Vec<Uuid>,
    pub inserted: Vec<PersistedSlide>,
    pub updated: Vec<Uuid>,
    pub pruned_keys: Vec<String>,
}

/// Saves an edited slide list against a [`SlideStore`] and [`BlobStore`].
pub struct SlideSetReconciler<'a, S, B> {
    slides: &'a S,
    blobs: &'a B,
    options: ReconcileOptions,
    saved_at_millis: i64,
}

impl<'a, S: SlideStore, B: BlobStore> SlideSetReconciler<'a, S, B> {
    pub fn new(slides: &'a S, blobs: &'a B) -> Self {
        Self {
            slides,
            blobs,
            options: ReconcileOptions::default(),
            saved_at_millis: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the timestamp used in upload keys.
    pub fn with_timestamp(mut self, saved_at_millis: i64) -> Self {
        self.saved_at_millis = saved_at_millis;
        self
    }

    /// Make the stored slides of `tutorial_id` mirror `edits`, in order.
    pub async fn reconcile(&self, tutorial_id: Uuid, edits: &[SlideEdit]) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        // Refuse a malformed list before anything is uploaded
        ensure_unique_ids(edits)?;

        log::debug!("Saving {} slides for tutorial {}: {}", edits.len(), tutorial_id, ReconcileStage::UploadingImages);
        let image_urls = self.upload_images(tutorial_id, edits, &mut report).await?;

        log::debug!("Tutorial {}: {}", tutorial_id, ReconcileStage::Diffing);
        let existing = self
            .slides
            .slide_refs(tutorial_id)
            .await
            .map_err(at(ReconcileStage::Diffing))?;
        let plan = SlidePlan::build(tutorial_id, &existing, edits, &image_urls)?;

        if !plan.deletes.is_empty() {
            log::debug!("Tutorial {}: {} ({})", tutorial_id, ReconcileStage::Deleting, plan.deletes.len());
            self.slides
                .delete_slides(&plan.deletes)
                .await
                .map_err(at(ReconcileStage::Deleting))?;
        }
        report.deleted = plan.deletes.clone();

        if !plan.inserts.is_empty() {
            log::debug!("Tutorial {}: {} ({})", tutorial_id, ReconcileStage::Inserting, plan.inserts.len());
            report.inserted = self
                .slides
                .insert_slides(&plan.inserts)
                .await
                .map_err(at(ReconcileStage::Inserting))?;
        }

        if !plan.updates.is_empty() {
            log::debug!("Tutorial {}: {} ({})", tutorial_id, ReconcileStage::Updating, plan.updates.len());
            self.slides
                .upsert_slides(&plan.updates)
                .await
                .map_err(at(ReconcileStage::Updating))?;
        }
        report.updated = plan.updates.iter().map(|s| s.id).collect();

        if self.options.prune_orphaned_images {
            report.pruned_keys = self.prune(tutorial_id, &plan, &existing).await?;
        }

        log::info!(
            "Saved tutorial {} slides: {} inserted, {} updated, {} deleted, {} uploaded",
            tutorial_id,
            report.inserted.len(),
            report.updated.len(),
            report.deleted.len(),
            report.uploaded_keys.len()
        );
        Ok(report)
    }

    /// Upload pending images concurrently and resolve every slide's URL.
    async fn upload_images(
        &self,
        tutorial_id: Uuid,
        edits: &[SlideEdit],
        report: &mut ReconcileReport,
    ) -> Result<Vec<Option<String>>, ReconcileError> {
        let uploads = edits.iter().enumerate().map(|(idx, edit)| async move {
            let position = idx + 1;
            match &edit.image {
                None => Ok::<_, ReconcileError>((None, None)),
                Some(ImageRef::Persisted(url)) => Ok((Some(url.clone()), None)),
                Some(ImageRef::Pending(image)) => {
                    let key = slide_key(tutorial_id, position, self.saved_at_millis, image.extension());
                    let options = UploadOptions {
                        content_type: image.content_type(),
                        overwrite: true,
                    };
                    self.blobs
                        .upload(&key, &image.bytes, options)
                        .await
                        .map_err(|source| ReconcileError::Upload { position, source })?;
                    Ok((Some(self.blobs.public_url(&key)), Some(key)))
                }
            }
        });

        // Let every upload settle before reporting the first failure
        let results = join_all(uploads).await;

        let mut urls = Vec::with_capacity(results.len());
        for result in results {
            let (url, key) = result?;
            urls.push(url);
            report.uploaded_keys.extend(key);
        }
        Ok(urls)
    }

    async fn prune(
        &self,
        tutorial_id: Uuid,
        plan: &SlidePlan,
        existing: &[SlideRef],
    ) -> Result<Vec<String>, ReconcileError> {
        let bucket = self.blobs.bucket();
        let keys: Vec<String> = plan
            .orphaned_urls(existing)
            .iter()
            .filter_map(|url| {
                let key = tutorial_key_from_url(url, bucket, tutorial_id);
                if key.is_none() {
                    log::warn!("Not pruning image outside tutorial {}: {}", tutorial_id, url);
                }
                key
            })
            .collect();

        if !keys.is_empty() {
            log::debug!("{} ({})", ReconcileStage::PruningImages, keys.len());
            self.blobs
                .remove(&keys)
                .await
                .map_err(at(ReconcileStage::PruningImages))?;
        }
        Ok(keys)
    }
}
