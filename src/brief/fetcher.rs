use crate::brief::types::{CategoryRef, CategoryResult, FeedItem, SourceType};
use crate::util::{validate_endpoint, UrlValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Summary used when a ref is missing its title or source type.
pub const NO_DATA_SUMMARY: &str = "No data available";
/// Summary used when upstream answered with a non-success status or timed out.
pub const FAILED_SUMMARY: &str = "Failed to load summary";
/// Summary used when upstream succeeded but returned no summary text.
pub const EMPTY_SUMMARY: &str = "No summary available";
/// Category name used for refs without a title.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Transport-level failures of a summary request.
///
/// Upstream error statuses and timeouts are *not* represented here: those
/// are recovered into a placeholder [`CategoryResult`]. Whatever ends up in
/// this enum aborts the whole aggregation join.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured endpoint is not a usable http(s) URL
    #[error("Invalid summary endpoint: {0}")]
    InvalidEndpoint(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, interrupted body, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body was not JSON, or had the wrong shape
    #[error("Malformed response for '{category}': {source}")]
    MalformedBody {
        category: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest<'a> {
    category: &'a str,
    source_type: SourceType,
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    items: Option<Vec<FeedItem>>,
}

/// Issues one summary request per category and normalizes the answer.
#[derive(Clone)]
pub struct SummaryFetcher {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl SummaryFetcher {
    /// Create a fetcher posting to `endpoint`. No timeout is applied until
    /// [`with_timeout`](Self::with_timeout) is called.
    pub fn new(client: reqwest::Client, endpoint: &str) -> Result<Self, FetchError> {
        let endpoint = validate_endpoint(endpoint)?;
        Ok(Self {
            client,
            endpoint,
            timeout: None,
        })
    }

    /// Bound each request (send plus body read). `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the summary for one category.
    ///
    /// Always yields exactly one [`CategoryResult`] whose `category` is the
    /// ref's title (or `"Unknown"`):
    ///
    /// - incomplete ref: `"No data available"`, no request issued
    /// - non-success status or timeout: `"Failed to load summary"`, logged
    /// - success: upstream summary (or `"No summary available"`) and items
    ///
    /// # Errors
    ///
    /// [`FetchError::Network`] and [`FetchError::MalformedBody`] are returned
    /// rather than recovered. The body is decoded before the status is looked
    /// at, so a non-JSON error page is also a transport failure.
    pub async fn fetch(&self, category: &CategoryRef) -> Result<CategoryResult, FetchError> {
        let source_type = match category.source_type {
            Some(source_type) if !category.title.is_empty() => source_type,
            _ => {
                tracing::warn!(
                    title = %category.title,
                    source_type = ?category.source_type,
                    "Skipping invalid category"
                );
                let name = if category.title.is_empty() {
                    UNKNOWN_CATEGORY
                } else {
                    category.title.as_str()
                };
                return Ok(CategoryResult::new(name, NO_DATA_SUMMARY));
            }
        };

        let title = category.title.as_str();
        tracing::debug!(category = %title, source_type = %source_type, "Requesting summary");

        let request = self.request(title, source_type);
        let (status, body) = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(outcome) => outcome?,
                Err(_) => {
                    tracing::warn!(
                        category = %title,
                        timeout_secs = limit.as_secs_f64(),
                        "Summary request timed out"
                    );
                    return Ok(CategoryResult::new(title, FAILED_SUMMARY));
                }
            },
            None => request.await?,
        };

        tracing::debug!(category = %title, status = %status, "Summary response received");

        let data: serde_json::Value =
            serde_json::from_slice(&body).map_err(|source| FetchError::MalformedBody {
                category: title.to_owned(),
                source,
            })?;

        if !status.is_success() {
            let upstream_error = data.get("error").cloned().unwrap_or_default();
            tracing::error!(
                category = %title,
                status = status.as_u16(),
                error = %upstream_error,
                "Failed to fetch summary"
            );
            return Ok(CategoryResult::new(title, FAILED_SUMMARY));
        }

        let response: SummaryResponse =
            serde_json::from_value(data).map_err(|source| FetchError::MalformedBody {
                category: title.to_owned(),
                source,
            })?;

        let summary = response
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| EMPTY_SUMMARY.to_owned());

        Ok(CategoryResult {
            category: title.to_owned(),
            summary,
            items: response.items.unwrap_or_default(),
        })
    }

    async fn request(
        &self,
        title: &str,
        source_type: SourceType,
    ) -> Result<(reqwest::StatusCode, Vec<u8>), FetchError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SummaryRequest {
                category: title,
                source_type,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT_PATH: &str = "/api/newsFetcher";

    fn fetcher_for(server: &MockServer) -> SummaryFetcher {
        SummaryFetcher::new(
            reqwest::Client::new(),
            &format!("{}{}", server.uri(), ENDPOINT_PATH),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_summary_and_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(body_json(serde_json::json!({"category": "World", "sourceType": "reliable"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "Markets rallied.",
                "items": [
                    {"title": "Stocks up", "content": "Indexes rose", "link": "https://example.com/1"},
                    {"title": "Bonds flat", "content": "Yields held"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await
            .unwrap();

        assert_eq!(result.category, "World");
        assert_eq!(result.summary, "Markets rallied.");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(result.items[1].link, None);
    }

    #[tokio::test]
    async fn test_self_source_type_on_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"category": "Rust", "sourceType": "self"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"summary": "ok", "items": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("Rust", SourceType::SelfSelected))
            .await
            .unwrap();
        assert_eq!(result.summary, "ok");
    }

    #[tokio::test]
    async fn test_error_status_recovers_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})),
            )
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await
            .unwrap();

        assert_eq!(result, CategoryResult::new("World", FAILED_SUMMARY));
    }

    #[tokio::test]
    async fn test_missing_summary_and_items_use_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"summary": "", "items": null})),
            )
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("Tech", SourceType::Reliable))
            .await
            .unwrap();

        assert_eq!(result, CategoryResult::new("Tech", EMPTY_SUMMARY));
    }

    #[tokio::test]
    async fn test_invalid_ref_short_circuits_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);

        let untitled = fetcher
            .fetch(&CategoryRef::new("", SourceType::SelfSelected))
            .await
            .unwrap();
        assert_eq!(untitled, CategoryResult::new(UNKNOWN_CATEGORY, NO_DATA_SUMMARY));

        let unsourced = fetcher
            .fetch(&CategoryRef {
                title: "Tech".into(),
                source_type: None,
            })
            .await
            .unwrap();
        assert_eq!(unsourced, CategoryResult::new("Tech", NO_DATA_SUMMARY));
    }

    #[tokio::test]
    async fn test_non_json_body_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await;

        match result {
            Err(FetchError::MalformedBody { category, .. }) => assert_eq!(category, "World"),
            other => panic!("Expected MalformedBody, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_items_shape_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"summary": "x", "items": "nope"})),
            )
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await;
        assert!(matches!(result, Err(FetchError::MalformedBody { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop a server so the port is closed
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let fetcher =
            SummaryFetcher::new(reqwest::Client::new(), &format!("{}{}", uri, ENDPOINT_PATH))
                .unwrap();

        let result = fetcher
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_timeout_recovers_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"summary": "late", "items": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let result = fetcher_for(&server)
            .with_timeout(Some(Duration::from_millis(50)))
            .fetch(&CategoryRef::new("World", SourceType::Reliable))
            .await
            .unwrap();

        assert_eq!(result, CategoryResult::new("World", FAILED_SUMMARY));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = SummaryFetcher::new(reqwest::Client::new(), "ftp://example.com/api");
        assert!(matches!(result, Err(FetchError::InvalidEndpoint(_))));
    }
}
