use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{BlobStore, StoreError, UploadOptions, public_object_url, validate_key};

/// Bucket stored as plain files under `<root>/<bucket>/`.
///
/// Objects are served read-only by the HTTP layer at
/// `/storage/v1/object/public/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Directory holding the storage root (parent of every bucket).
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(&self.bucket).join(key))
    }
}

impl BlobStore for LocalBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions<'_>) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        if !options.overwrite && tokio::fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }

        tokio::fs::write(&path, data).await?;
        log::debug!("Stored {} ({} bytes, {})", key, data.len(), options.content_type);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.public_base_url, &self.bucket, key)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            let path = self.object_path(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => log::debug!("Removed {}", key),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::warn!("Object {} already missing", key);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
