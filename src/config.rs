use std::str::FromStr;

use crate::images::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY, NormalizeOptions};
use crate::slides::ReconcileOptions;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_STORAGE_ROOT: &str = "data/storage";
pub const DEFAULT_STORAGE_BUCKET: &str = "tutorial-images";
pub const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 365;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Superadmin created at startup when no account with this email exists.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub association_id: String,
    pub association_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub public_base_url: String,
    pub storage_root: String,
    pub storage_bucket: String,
    pub image: NormalizeOptions,
    pub notifications_require_approval: bool,
    pub prune_orphaned_images: bool,
    pub audit_retention_days: i64,
    pub max_payload_bytes: usize,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    /// Read the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let image = NormalizeOptions {
            max_width: parse_or(&get, "IMAGE_MAX_WIDTH", DEFAULT_MAX_WIDTH)?,
            max_height: parse_or(&get, "IMAGE_MAX_HEIGHT", DEFAULT_MAX_HEIGHT)?,
            quality: parse_or(&get, "IMAGE_QUALITY", DEFAULT_QUALITY)?,
        };
        if image.max_width == 0 {
            return Err(invalid("IMAGE_MAX_WIDTH", "0"));
        }
        if image.max_height == 0 {
            return Err(invalid("IMAGE_MAX_HEIGHT", "0"));
        }
        if !(image.quality > 0.0 && image.quality <= 1.0) {
            return Err(invalid("IMAGE_QUALITY", &image.quality.to_string()));
        }

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                association_id: get("ADMIN_ASSOCIATION_ID").unwrap_or_else(|| "spolky".to_string()),
                association_name: get("ADMIN_ASSOCIATION_NAME").unwrap_or_else(|| "Spolky".to_string()),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_key: get("SESSION_KEY"),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            storage_root: get("STORAGE_ROOT").unwrap_or_else(|| DEFAULT_STORAGE_ROOT.to_string()),
            storage_bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            image,
            notifications_require_approval: flag(&get, "NOTIFICATIONS_REQUIRE_APPROVAL")?,
            prune_orphaned_images: flag(&get, "SLIDES_PRUNE_ORPHANS")?,
            audit_retention_days: parse_or(&get, "AUDIT_RETENTION_DAYS", DEFAULT_AUDIT_RETENTION_DAYS)?,
            max_payload_bytes: parse_or(&get, "MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?,
            admin,
        })
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            prune_orphaned_images: self.prune_orphaned_images,
        }
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid { name, value: value.to_string() }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(raw) => raw.parse().map_err(|_| invalid(name, &raw)),
        None => Ok(default),
    }
}

fn flag(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    match get(name).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(invalid(name, other)),
    }
}
