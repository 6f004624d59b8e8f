//! The relay pipeline: validate, fetch, name, upload.
//!
//! [`Relay::relay`] performs one request end to end. Each step either hands its result to the next
//! or ends the request with an [`Error`]; nothing is retried and nothing is written to storage
//! unless every earlier step succeeded.

pub mod fetch;
pub mod filename;
pub mod mime;
pub mod storage;
pub mod validate;

use bytes::BytesMut;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::Config;
use crate::errors::{Error, Result};
use fetch::ContentFetcher;
use storage::{BunnyStorage, ObjectStore};

/// Most bytes of a rejected response body kept for the logs.
pub const ERROR_BODY_EXCERPT_LIMIT: usize = 4 * 1024;

/// Read at most [`ERROR_BODY_EXCERPT_LIMIT`] bytes of a failed response body for logging.
///
/// The rest of the body is never read. Read errors end the excerpt early.
pub async fn error_body_excerpt(mut response: reqwest::Response) -> String {
    let mut excerpt = BytesMut::new();
    while excerpt.len() < ERROR_BODY_EXCERPT_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(ERROR_BODY_EXCERPT_LIMIT - excerpt.len());
                excerpt.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&excerpt).into_owned()
}

/// Fetcher and store shared by all requests. Cheap to clone.
#[derive(Clone)]
pub struct Relay {
    fetcher: ContentFetcher,
    store: Arc<dyn ObjectStore>,
    config: Config,
}

impl Relay {
    /// Build a relay writing to the Bunny storage zone named in `config`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(BunnyStorage::new(config.clone())?);
        Self::with_store(config, store)
    }

    /// Build a relay writing to an arbitrary store.
    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let fetcher = ContentFetcher::new(config.limits.fetch_timeout, config.limits.max_payload_size)?;
        Ok(Self { fetcher, store, config })
    }

    /// Relay the media at `content` into the folder for `guild_id`, returning its public URL.
    #[instrument(skip(self))]
    pub async fn relay(&self, guild_id: &str, content: &str) -> Result<String> {
        if !validate::is_valid_guild_id(guild_id) {
            return Err(Error::bad_request("invalid discord guild id"));
        }

        let Some(url) = validate::parse_content_url(content) else {
            return Err(Error::bad_request("invalid url"));
        };

        let fetched = self.fetcher.fetch(&url).await?;

        let filename = filename::generate_filename(fetched.extension);
        let path = storage::object_path(guild_id, &filename);
        self.store.put(&path, fetched.bytes).await?;

        let public_url = self.config.public_url(&path);
        info!(content_type = %fetched.content_type, %public_url, "Relayed content");
        Ok(public_url)
    }
}
