//! Tutorial slide editing and persistence.
//!
//! The editor keeps an ordered [`SlideList`]; saving hands a snapshot of it
//! to [`SlideSetReconciler`], which turns it into row and blob mutations.

pub mod cleanup;
pub mod locks;
pub mod reconcile;

use uuid::Uuid;

use crate::images::NormalizedImage;
use crate::models::tutorial::PersistedSlide;

pub use crate::models::tutorial::SlideLayout;
pub use cleanup::{PurgeReport, purge_tutorial};
pub use locks::{SaveGuard, SaveLocks};
pub use reconcile::{ReconcileError, ReconcileOptions, ReconcileReport, ReconcileStage, SlidePlan, SlideSetReconciler};

/// Image attached to a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// Already uploaded; the URL is kept as is.
    Persisted(String),
    /// Normalized locally, uploaded on save.
    Pending(NormalizedImage),
}

/// One slide of the edited list.
///
/// The slide's order is its position in the list and is not stored here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideEdit {
    /// Present iff the slide already exists in the store.
    pub id: Option<Uuid>,
    pub layout: SlideLayout,
    pub image: Option<ImageRef>,
}

impl SlideEdit {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn existing(id: Uuid, image_url: Option<String>) -> Self {
        Self {
            id: Some(id),
            layout: SlideLayout::Single,
            image: image_url.map(ImageRef::Persisted),
        }
    }

    pub fn with_pending(image: NormalizedImage) -> Self {
        Self {
            id: None,
            layout: SlideLayout::Single,
            image: Some(ImageRef::Pending(image)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered list of slides being edited.
///
/// The editing operations serve an editor session between saves. A save
/// request is collected into one before it reaches the reconciler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideList {
    slides: Vec<SlideEdit>,
}

impl SlideList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load stored rows in their saved order.
    pub fn from_persisted(mut rows: Vec<PersistedSlide>) -> Self {
        rows.sort_by_key(|row| row.order);
        let slides = rows
            .into_iter()
            .map(|row| SlideEdit::existing(row.id, row.image_url))
            .collect();
        Self { slides }
    }

    pub fn push(&mut self, slide: SlideEdit) {
        self.slides.push(slide);
    }

    /// Append a slide with no id and no image.
    pub fn push_blank(&mut self) {
        self.slides.push(SlideEdit::blank());
    }

    /// Swap the slide at `index` with its neighbour. Returns false when the
    /// move would leave the list.
    pub fn move_slide(&mut self, index: usize, direction: MoveDirection) -> bool {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        };
        match target {
            Some(t) if index < self.slides.len() && t < self.slides.len() => {
                self.slides.swap(index, t);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<SlideEdit> {
        (index < self.slides.len()).then(|| self.slides.remove(index))
    }

    /// Replace the image of the slide at `index` with a pending upload.
    pub fn attach_image(&mut self, index: usize, image: NormalizedImage) -> bool {
        match self.slides.get_mut(index) {
            Some(slide) => {
                slide.image = Some(ImageRef::Pending(image));
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[SlideEdit] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

impl FromIterator<SlideEdit> for SlideList {
    fn from_iter<I: IntoIterator<Item = SlideEdit>>(iter: I) -> Self {
        Self { slides: iter.into_iter().collect() }
    }
}
