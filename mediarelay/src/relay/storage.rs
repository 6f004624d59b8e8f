//! Writing relayed media to the storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header::CONTENT_TYPE};
use tracing::{debug, error, instrument};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::relay::error_body_excerpt;

/// Folder every relayed object lives under.
pub const STORAGE_PREFIX: &str = "discord";

/// Object path for a guild's upload, relative to the storage zone and the public domain.
pub fn object_path(guild_id: &str, filename: &str) -> String {
    format!("{STORAGE_PREFIX}/{guild_id}/{filename}")
}

/// A store that accepts whole-object writes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` at `path`, replacing anything already there.
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()>;
}

/// Bunny storage zone, written with authenticated PUTs.
#[derive(Debug, Clone)]
pub struct BunnyStorage {
    client: Client,
    config: Config,
}

impl BunnyStorage {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        crate::install_crypto_provider();
        let client = Client::builder()
            .timeout(config.limits.upload_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create storage client: {e}"))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ObjectStore for BunnyStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        let Some(access_key) = self.config.bunny_api_pass.as_deref().filter(|key| !key.is_empty()) else {
            return Err(Error::Misconfigured {
                what: "BUNNY_API_PASS is not set".to_string(),
            });
        };

        let url = self.config.storage_url(path);
        debug!("Uploading to {}", url);

        let response = self
            .client
            .put(&url)
            .header("AccessKey", access_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        operation: "uploading content".to_string(),
                    }
                } else {
                    Error::UploadFailed {
                        path: path.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = error_body_excerpt(response).await;
            error!(%status, body = %body, "Storage backend rejected upload");
            return Err(Error::UploadFailed {
                path: path.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        Ok(())
    }
}
