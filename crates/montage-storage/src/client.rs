//! R2 client used as the blob cache and clip store.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::cache::BlobCache;
use crate::error::{StorageError, StorageResult};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Namespace prepended to every object key; empty for the bucket root.
    pub key_prefix: String,
}

fn required_env(key: &str) -> StorageResult<String> {
    std::env::var(key).map_err(|_| StorageError::config_error(format!("{} not set", key)))
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: required_env("R2_ENDPOINT_URL")?,
            access_key_id: required_env("R2_ACCESS_KEY_ID")?,
            secret_access_key: required_env("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required_env("R2_BUCKET_NAME")?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            key_prefix: std::env::var("R2_KEY_PREFIX").unwrap_or_default(),
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    key_prefix: String,
}

impl R2Client {
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
        }
    }

    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(R2Config::from_env()?))
    }

    /// Full object key for `key` under the configured namespace.
    pub fn object_key(&self, key: &str) -> String {
        join_key(&self.key_prefix, key)
    }

    /// Upload a local file; returns the full object key.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        let path = path.as_ref();
        let object_key = self.object_key(key);
        debug!(path = %path.display(), key = %object_key, "Uploading file");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        self.put_object(&object_key, body, content_type).await?;

        info!(path = %path.display(), key = %object_key, "Uploaded file");
        Ok(object_key)
    }

    pub async fn upload_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        let object_key = self.object_key(key);
        debug!(key = %object_key, bytes = data.len(), "Uploading bytes");
        self.put_object(&object_key, ByteStream::from(data), content_type).await
    }

    async fn put_object(&self, object_key: &str, body: ByteStream, content_type: &str) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        Ok(())
    }

    /// Download an object; a missing key is [`StorageError::NotFound`].
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        let object_key = self.object_key(key);
        debug!(key = %object_key, "Downloading object");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_no_such_key() => StorageError::not_found(&object_key),
                _ => StorageError::DownloadFailed(e.to_string()),
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        let object_key = self.object_key(key);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_not_found() => Ok(false),
                _ => Err(StorageError::AwsSdk(e.to_string())),
            },
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

#[async_trait]
impl BlobCache for R2Client {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        R2Client::exists(self, key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self.download_bytes(key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        self.upload_bytes(data, key, CONTENT_TYPE_JSON).await
    }
}
