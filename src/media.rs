//! Local-disk media buckets.
//!
//! Uploaded files land in `<media-dir>/<bucket>/<unix-millis>-<file name>` and
//! are served read-only under `/media/<bucket>/`. Object keys are always a
//! single path component.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

pub const MEDIA_ROUTE: &str = "/media";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Photos,
    Videos,
}

impl Bucket {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::Videos => "videos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: PathBuf, public_base_url: &str) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` under a fresh, timestamp-prefixed key. Never overwrites.
    ///
    /// # Errors
    /// Returns an error for an unusable file name or when the write fails.
    pub async fn put(&self, bucket: Bucket, file_name: &str, bytes: &[u8]) -> Result<StoredObject> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| anyhow!("invalid file name: {file_name:?}"))?;
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let key = format!("{millis}-{name}");

        let dir = self.root.join(bucket.as_str());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create bucket directory {}", dir.display()))?;

        let path = dir.join(&key);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        file.flush().await?;

        debug!(bucket = bucket.as_str(), key = %key, size = bytes.len(), "media stored");

        Ok(StoredObject {
            public_url: self.public_url(bucket, &key),
            key,
        })
    }

    /// Remove an object; a missing object is not an error.
    ///
    /// # Errors
    /// Returns an error for an invalid key or when deletion fails.
    pub async fn remove(&self, bucket: Bucket, key: &str) -> Result<()> {
        if sanitize_file_name(key).as_deref() != Some(key) {
            return Err(anyhow!("invalid object key: {key:?}"));
        }
        let path = self.root.join(bucket.as_str()).join(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(bucket = bucket.as_str(), key = %key, "media object already gone");
                Ok(())
            }
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    #[must_use]
    pub fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!(
            "{}{MEDIA_ROUTE}/{}/{key}",
            self.public_base_url,
            bucket.as_str()
        )
    }

    /// Key of `url` when it points into one of our buckets, `None` for
    /// external links.
    #[must_use]
    pub fn owned_key<'a>(&self, bucket: Bucket, url: &'a str) -> Option<&'a str> {
        let prefix = self.public_url(bucket, "");
        url.strip_prefix(prefix.as_str())
            .filter(|key| !key.is_empty() && !key.contains('/'))
    }
}

/// Reduce a client file name to one safe path component.
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        None
    } else {
        Some(cleaned)
    }
}
