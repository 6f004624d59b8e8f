//! Downloading media from the caller-provided URL.

use bytes::{Bytes, BytesMut};
use reqwest::{
    Client,
    header::{CONTENT_TYPE, LOCATION},
};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::{Error, Result};
use crate::relay::{error_body_excerpt, mime};

const FETCH_OPERATION: &str = "fetching content";

/// A fully buffered remote object whose type is in the mime table.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Bytes,
    pub content_type: String,
    pub extension: &'static str,
}

/// Issues the GET against the remote origin and buffers the body, within a deadline and a
/// size limit.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    max_payload_size: u64,
}

impl ContentFetcher {
    /// `max_payload_size` of 0 disables the size check.
    pub fn new(timeout: Duration, max_payload_size: u64) -> anyhow::Result<Self> {
        crate::install_crypto_provider();
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("mediarelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create fetch client: {e}"))?;

        Ok(Self { client, max_payload_size })
    }

    /// GET `url`, check the status and declared content type, then read the body.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchedContent> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if status.is_redirection() {
            warn!(%status, location = ?response.headers().get(LOCATION), "Remote origin answered with a redirect");
            return Err(Error::FetchFailed {
                url: url.to_string(),
                reason: format!("redirects are not followed (HTTP {status})"),
            });
        }

        if status.as_u16() >= 400 {
            let body = error_body_excerpt(response).await;
            warn!(%status, body = %body, "Remote origin rejected content request");
            return Err(Error::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let Some(extension) = content_type.as_deref().and_then(mime::extension_for) else {
            return Err(Error::UnsupportedContentType { content_type });
        };
        let content_type = content_type.unwrap_or_default();

        if self.max_payload_size > 0
            && let Some(declared) = response.content_length()
            && declared > self.max_payload_size
        {
            return Err(Error::PayloadTooLarge {
                limit: self.max_payload_size,
            });
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
            if self.max_payload_size > 0 && (buffer.len() + chunk.len()) as u64 > self.max_payload_size {
                return Err(Error::PayloadTooLarge {
                    limit: self.max_payload_size,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        debug!(size = buffer.len(), %content_type, "Fetched remote content");

        Ok(FetchedContent {
            bytes: buffer.freeze(),
            content_type,
            extension,
        })
    }
}

fn request_error(url: &Url, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::Timeout {
            operation: FETCH_OPERATION.to_string(),
        };
    }

    warn!(error = %e, "Failed to fetch remote content");
    Error::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn origin_with(template: ResponseTemplate) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/file"))
            .respond_with(template)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/media/file", server.uri())).unwrap();
        (server, url)
    }

    fn fetcher() -> ContentFetcher {
        ContentFetcher::new(Duration::from_secs(5), 1024).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_png() {
        let (_server, url) =
            origin_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png")).await;

        let content = fetcher().fetch(&url).await.unwrap();
        assert_eq!(content.extension, "png");
        assert_eq!(content.content_type, "image/png");
        assert_eq!(&content.bytes[..], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_error_status_rejected_regardless_of_type() {
        let (_server, url) = origin_with(ResponseTemplate::new(404).set_body_raw("gone", "image/png")).await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_large_error_body_not_buffered() {
        let (_server, url) =
            origin_with(ResponseTemplate::new(404).set_body_raw(vec![b'x'; 8 * 1024 * 1024], "text/plain")).await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_redirect_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/file"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/media/final"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/final"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
            .expect(0)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/media/file", server.uri())).unwrap();

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_html_rejected() {
        let (_server, url) = origin_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html")).await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_content_type_rejected() {
        let (_server, url) = origin_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3])).await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedContentType { content_type: None }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (_server, url) = origin_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 2048], "video/mp4")).await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 1024 }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_zero_limit_is_unlimited() {
        let (_server, url) = origin_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 4096], "video/webm")).await;

        let fetcher = ContentFetcher::new(Duration::from_secs(5), 0).unwrap();
        let content = fetcher.fetch(&url).await.unwrap();
        assert_eq!(content.bytes.len(), 4096);
    }

    #[tokio::test]
    async fn test_slow_origin_times_out() {
        let (_server, url) = origin_with(
            ResponseTemplate::new(200)
                .set_body_raw("late", "image/webp")
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let fetcher = ContentFetcher::new(Duration::from_millis(200), 1024).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_origin() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/media/file", server.uri())).unwrap();
        drop(server);

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { .. }), "got {err:?}");
    }
}
