use uuid::Uuid;

use crate::storage::{BlobStore, SlideStore, StoreError, tutorial_key_from_url};

/// What a tutorial deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed_keys: Vec<String>,
    /// Image URLs that do not map to a key of this tutorial in the bucket.
    pub skipped_urls: Vec<String>,
}

/// Delete a tutorial together with every image its slides reference.
///
/// Blobs go first, then the tutorial row; slide rows follow the row through
/// the foreign key cascade.
pub async fn purge_tutorial<S: SlideStore, B: BlobStore>(
    slides: &S,
    blobs: &B,
    tutorial_id: Uuid,
) -> Result<PurgeReport, StoreError> {
    let refs = slides.slide_refs(tutorial_id).await?;

    let mut report = PurgeReport::default();
    for url in refs.into_iter().filter_map(|r| r.image_url) {
        match tutorial_key_from_url(&url, blobs.bucket(), tutorial_id) {
            Some(key) if !report.removed_keys.contains(&key) => report.removed_keys.push(key),
            Some(_) => {}
            None => {
                log::warn!("Keeping image not owned by tutorial {}: {}", tutorial_id, url);
                report.skipped_urls.push(url);
            }
        }
    }

    if !report.removed_keys.is_empty() {
        blobs.remove(&report.removed_keys).await?;
    }

    slides.delete_parent(tutorial_id).await?;

    log::info!(
        "Deleted tutorial {} and {} images",
        tutorial_id,
        report.removed_keys.len()
    );
    Ok(report)
}
