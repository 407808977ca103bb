use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

pub const MAX_REDIRECTS: usize = 10;

/// Transport-level reason a fetch produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    Connection,
    Other(String),
}

impl FetchFailure {
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_connect() || error.is_request() {
            FetchFailure::Connection
        } else {
            FetchFailure::Other(error.to_string())
        }
    }

    pub fn into_error(self, url: &str) -> ScanError {
        match self {
            FetchFailure::Timeout => ScanError::FetchTimeout(url.to_string()),
            FetchFailure::Connection => ScanError::FetchTransport {
                url: url.to_string(),
                reason: "connection failed".to_string(),
            },
            FetchFailure::Other(reason) => ScanError::FetchTransport {
                url: url.to_string(),
                reason,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success {
        status: u16,
        content_type: String,
        body: String,
    },
    Skipped {
        status: u16,
        content_type: Option<String>,
    },
    Failure {
        reason: FetchFailure,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Issues single GET requests under the crawl's timeout, redirect and TLS policy.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        // Targets are frequently self-signed; this is recon, not trust validation
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .danger_accept_invalid_certs(true)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        debug!("Fetching {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetch of {} failed: {}", url, e);
                return FetchOutcome::Failure {
                    reason: FetchFailure::from_reqwest(&e),
                };
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let is_html = content_type
            .as_ref()
            .map(|ct| ct.to_lowercase().starts_with("text/html"))
            .unwrap_or(false);

        if status != 200 || !is_html {
            debug!("Skipping {} (status {}, content-type {:?})", url, status, content_type);
            return FetchOutcome::Skipped {
                status,
                content_type,
            };
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success {
                status,
                content_type: content_type.unwrap_or_default(),
                body,
            },
            Err(e) => {
                debug!("Reading body of {} failed: {}", url, e);
                FetchOutcome::Failure {
                    reason: FetchFailure::from_reqwest(&e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fetcher() -> PageFetcher {
        PageFetcher::new(&CrawlConfig::new().with_timeout(Duration::from_millis(500))).unwrap()
    }

    #[tokio::test]
    async fn test_html_page_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_bytes("<html><body>hi</body></html>"),
            )
            .mount(&server)
            .await;

        match fetcher().fetch(&server.uri()).await {
            FetchOutcome::Success {
                status,
                content_type,
                body,
            } => {
                assert_eq!(status, 200);
                assert!(content_type.starts_with("text/html"));
                assert!(body.contains("hi"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_content_type_match_is_case_insensitive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "Text/HTML")
                    .set_body_bytes("<p>x</p>"),
            )
            .mount(&server)
            .await;

        assert!(fetcher().fetch(&server.uri()).await.is_success());
    }

    #[tokio::test]
    async fn test_non_html_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes("{\"ok\":true}"),
            )
            .mount(&server)
            .await;

        match fetcher().fetch(&server.uri()).await {
            FetchOutcome::Skipped {
                status,
                content_type,
            } => {
                assert_eq!(status, 200);
                assert_eq!(content_type.as_deref(), Some("application/json"));
            }
            other => panic!("expected skipped, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes("not found"),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            fetcher().fetch(&server.uri()).await,
            FetchOutcome::Skipped { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(matches!(
            fetcher().fetch(&server.uri()).await,
            FetchOutcome::Skipped {
                content_type: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes("moved"),
            )
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&format!("{}/old", server.uri())).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            fetcher().fetch(&server.uri()).await,
            FetchOutcome::Failure {
                reason: FetchFailure::Timeout
            }
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_is_failure() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = fetcher().fetch(&format!("http://{}/", addr)).await;
        assert!(matches!(outcome, FetchOutcome::Failure { .. }));
    }

    #[test]
    fn test_failure_maps_to_scan_error() {
        assert!(matches!(
            FetchFailure::Timeout.into_error("http://x"),
            ScanError::FetchTimeout(_)
        ));
        assert!(matches!(
            FetchFailure::Connection.into_error("http://x"),
            ScanError::FetchTransport { .. }
        ));
    }
}
