use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::validate;

/// Days a notification stays visible when no expiry is given.
pub const DEFAULT_LIFETIME_DAYS: i64 = 14;

pub const TITLE_MAX_LEN: usize = 100;
pub const LINK_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Approved => "approved",
            NotificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    #[default]
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        }
    }
}

/// Notification row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub association_id: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub priority: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub view_count: i64,
    pub click_count: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Notification as returned by the API, with the computed expiry flag.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub is_expired: bool,
}

impl NotificationView {
    pub fn at(notification: Notification, now: DateTime<Utc>) -> Self {
        let is_expired = notification.is_expired(now);
        Self { notification, is_expired }
    }
}

/// Notification as shown to the public. Omits operator and moderation data.
#[derive(Debug, Clone, Serialize)]
pub struct PublicNotification {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub priority: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Notification> for PublicNotification {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            body: n.body,
            link: n.link,
            priority: n.priority,
            expires_at: n.expires_at,
        }
    }
}

/// JSON body for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Expiry date (00:00 UTC); defaults to two weeks from today.
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(default)]
    pub priority: NotificationPriority,
}

/// Validated insert payload.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub association_id: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub priority: NotificationPriority,
    pub status: NotificationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewNotification {
    /// Validate a request and fill in the defaults.
    pub fn from_request(
        req: &NotificationRequest,
        association_id: &str,
        created_by: &str,
        require_approval: bool,
        today: NaiveDate,
    ) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&req.title, "Title", TITLE_MAX_LEN));

        let link = req
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);
        if let Some(l) = &link {
            errors.extend(validate::validate_link(l, LINK_MAX_LEN));
        }

        let expires_on = req
            .expires_on
            .unwrap_or(today + Duration::days(DEFAULT_LIFETIME_DAYS));
        if expires_on <= today {
            errors.push("Expiry date must be in the future".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let title = req.title.trim().to_string();
        Ok(Self {
            association_id: association_id.to_string(),
            body: title.clone(),
            title,
            link,
            priority: req.priority,
            status: if require_approval {
                NotificationStatus::Pending
            } else {
                NotificationStatus::Approved
            },
            expires_at: expires_on.and_time(NaiveTime::MIN).and_utc(),
            created_by: created_by.to_string(),
        })
    }
}
