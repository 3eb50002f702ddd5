//! Publishing local clip files as playable resources.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

const CONTENT_TYPE_MP4: &str = "video/mp4";

/// Uploads a local clip and returns the resource id it can be played from.
#[async_trait]
pub trait ClipPublisher: Send + Sync {
    async fn publish(&self, path: &Path) -> StorageResult<String>;
}

/// Publishes clips to R2 under a key prefix with a random object name.
#[derive(Clone)]
pub struct R2ClipPublisher {
    client: R2Client,
    prefix: String,
}

impl R2ClipPublisher {
    pub fn new(client: R2Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }
}

/// Object key for a published clip: `{prefix}/{uuid}.{ext}`.
pub fn published_clip_key(prefix: &str, path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[async_trait]
impl ClipPublisher for R2ClipPublisher {
    async fn publish(&self, path: &Path) -> StorageResult<String> {
        if !path.exists() {
            return Err(StorageError::not_found(path.display().to_string()));
        }
        let key = published_clip_key(&self.prefix, path);
        let resource_id = self.client.upload_file(path, &key, CONTENT_TYPE_MP4).await?;
        info!(path = %path.display(), resource_id = %resource_id, "Published clip");
        Ok(resource_id)
    }
}
