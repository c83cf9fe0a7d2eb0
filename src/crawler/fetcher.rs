//! HTTP fetcher
//!
//! Fetches a single page with a bounded timeout and classifies every failure
//! mode into a typed outcome. The fetcher never propagates an error past its
//! boundary: callers always receive a [`FetchOutcome`].

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::extract_title;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified failure of a single page fetch
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchFailure {
    /// The request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// Connection, DNS or transport-level failure
    #[error("network error: {message}")]
    Network { message: String },

    /// The URL could not be parsed
    #[error("malformed URL: {message}")]
    MalformedUrl { message: String },

    /// The unit was never scheduled because the batch was cancelled
    #[error("batch cancelled before fetch")]
    Cancelled,

    /// The worker running this unit failed unexpectedly
    #[error("internal worker error: {message}")]
    Internal { message: String },
}

/// Result of a single page fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Fetched {
        /// Page body content
        content: String,
        /// HTTP status code
        status_code: u16,
        /// Page title, when the body carried one
        title: Option<String>,
    },

    /// The fetch failed; the failure is classified, not thrown
    Failed(FetchFailure),
}

/// Builds the shared HTTP client used for all outbound requests
///
/// The client carries the identifying user-agent string and is constructed
/// once, then passed explicitly to every component that needs it — tests
/// substitute their own client pointed at a mock server.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single page
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `config` - Crawler configuration (supplies the fetch timeout)
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A [`FetchOutcome`]: either the page content with its status code and
/// extracted title, or one of the classified failures (timeout, non-2xx
/// status, network error, malformed URL).
pub async fn fetch_page(client: &Client, config: &CrawlerConfig, url: &str) -> FetchOutcome {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return FetchOutcome::Failed(FetchFailure::MalformedUrl {
                message: e.to_string(),
            });
        }
    };

    let response = match client
        .get(parsed)
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return FetchOutcome::Failed(classify_error(e)),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::Failed(FetchFailure::HttpStatus {
            status: status.as_u16(),
        });
    }

    match response.text().await {
        Ok(content) => {
            let title = extract_title(&content);
            FetchOutcome::Fetched {
                content,
                status_code: status.as_u16(),
                title,
            }
        }
        Err(e) => FetchOutcome::Failed(classify_error(e)),
    }
}

/// Maps a reqwest error onto the failure taxonomy
fn classify_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_builder() {
        FetchFailure::MalformedUrl {
            message: e.to_string(),
        }
    } else {
        FetchFailure::Network {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "QueryscopeBot".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success_with_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>A Page</title></head><body>hello</body></html>",
            ))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let config = CrawlerConfig::default();
        let outcome = fetch_page(&client, &config, &format!("{}/page", server.uri())).await;

        match outcome {
            FetchOutcome::Fetched {
                content,
                status_code,
                title,
            } => {
                assert!(content.contains("hello"));
                assert_eq!(status_code, 200);
                assert_eq!(title.as_deref(), Some("A Page"));
            }
            other => panic!("expected Fetched, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_classifies_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let config = CrawlerConfig::default();
        let outcome = fetch_page(&client, &config, &format!("{}/missing", server.uri())).await;

        match outcome {
            FetchOutcome::Failed(FetchFailure::HttpStatus { status }) => assert_eq!(status, 404),
            other => panic!("expected HttpStatus failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_classifies_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let config = CrawlerConfig {
            fetch_timeout_secs: 1,
            ..CrawlerConfig::default()
        };
        let outcome = fetch_page(&client, &config, &format!("{}/slow", server.uri())).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed(FetchFailure::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_fetch_classifies_malformed_url() {
        let client = build_http_client(&create_test_config()).unwrap();
        let config = CrawlerConfig::default();
        let outcome = fetch_page(&client, &config, "not a url").await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed(FetchFailure::MalformedUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_classifies_network_error() {
        // Port 1 on localhost should refuse connections.
        let client = build_http_client(&create_test_config()).unwrap();
        let config = CrawlerConfig::default();
        let outcome = fetch_page(&client, &config, "http://127.0.0.1:1/unreachable").await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed(FetchFailure::Network { .. })
        ));
    }
}
