/// Sample source — fetches a subject's published posts for voice analysis.
///
/// The engine never scrapes platforms directly; it talks to an internal
/// content service that owns platform credentials and rate limits. Behind a
/// trait so pipeline tests can swap in a canned source.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::models::sample::Sample;

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SampleSourceError {
    #[error("no account for handle '{0}'")]
    NotFound(String),

    #[error("account '{0}' is private or suspended")]
    PrivateOrSuspended(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Returns up to `max_count` recent posts for the handle, newest first.
    async fn fetch_samples(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Sample>, SampleSourceError>;
}

pub struct HttpSampleSource {
    client: Client,
    base_url: String,
}

impl HttpSampleSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch_samples(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Sample>, SampleSourceError> {
        let url = format!(
            "{}/v1/accounts/{}/posts",
            self.base_url.trim_end_matches('/'),
            handle
        );

        let response = self
            .client
            .get(&url)
            .query(&[("limit", max_count)])
            .send()
            .await
            .map_err(|e| SampleSourceError::Upstream(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(SampleSourceError::NotFound(handle.to_string())),
            StatusCode::FORBIDDEN => {
                return Err(SampleSourceError::PrivateOrSuspended(handle.to_string()))
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(SampleSourceError::Upstream(format!(
                    "sample service returned {status}: {body}"
                )));
            }
            _ => {}
        }

        let samples: Vec<Sample> = response
            .json()
            .await
            .map_err(|e| SampleSourceError::Upstream(format!("malformed sample payload: {e}")))?;

        debug!("Fetched {} samples for handle '{}'", samples.len(), handle);

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_parses_posts_and_passes_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/wes/posts"))
            .and(query_param("limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "text": "first post",
                    "like_count": 12,
                    "share_count": 3,
                    "reply_count": 1,
                    "created_at": "2026-02-01T12:00:00Z"
                },
                {
                    "text": "second post",
                    "created_at": "2026-01-28T09:30:00Z"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSampleSource::new(server.uri());
        let samples = source.fetch_samples("wes", 200).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].like_count, 12);
        assert_eq!(samples[1].engagement(), 0);
    }

    #[tokio::test]
    async fn test_unknown_handle_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSampleSource::new(server.uri());
        let err = source.fetch_samples("ghost", 50).await.unwrap_err();
        assert!(matches!(err, SampleSourceError::NotFound(h) if h == "ghost"));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_private_or_suspended() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = HttpSampleSource::new(server.uri());
        let err = source.fetch_samples("locked", 50).await.unwrap_err();
        assert!(matches!(err, SampleSourceError::PrivateOrSuspended(_)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("gateway sad"))
            .mount(&server)
            .await;

        let source = HttpSampleSource::new(server.uri());
        let err = source.fetch_samples("anyone", 50).await.unwrap_err();
        match err {
            SampleSourceError::Upstream(msg) => assert!(msg.contains("502")),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }
}
