use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slide layout. Only single-image slides exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    #[default]
    Single,
}

impl SlideLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideLayout::Single => "single",
        }
    }
}

/// Tutorial row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutorial {
    pub id: Uuid,
    pub association_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tutorial as shown in the list view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TutorialListItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub slide_count: i64,
}

/// Stored slide row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersistedSlide {
    pub id: Uuid,
    pub tutorial_id: Uuid,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub layout: String,
    pub image_url: Option<String>,
}

/// Slide row about to be inserted; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlide {
    pub tutorial_id: Uuid,
    pub order: i32,
    pub layout: SlideLayout,
    pub image_url: Option<String>,
}

/// The part of a stored slide the reconciler needs for diffing and cleanup.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SlideRef {
    pub id: Uuid,
    pub image_url: Option<String>,
}

/// Full tutorial with its slides in order.
#[derive(Debug, Clone, Serialize)]
pub struct TutorialDetail {
    #[serde(flatten)]
    pub tutorial: Tutorial,
    pub slides: Vec<PersistedSlide>,
}

/// Tutorial fields written on every save.
#[derive(Debug, Clone)]
pub struct TutorialFields {
    pub association_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_by: String,
}

/// JSON body of a tutorial save.
#[derive(Debug, Clone, Deserialize)]
pub struct TutorialSaveRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub slides: Vec<SlideInput>,
}

/// One slide of the edited list, in display order.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub layout: SlideLayout,
    #[serde(default)]
    pub image: Option<SlideImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SlideImageInput {
    /// Keep an already uploaded image.
    Persisted { url: String },
    /// New image, base64 encoded.
    Upload {
        data: String,
        content_type: String,
        #[serde(default)]
        file_name: Option<String>,
    },
}
