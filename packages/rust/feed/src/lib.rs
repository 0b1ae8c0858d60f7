//! arXiv RSS feed source.
//!
//! Downloads the day's listing feed (e.g. `https://rss.arxiv.org/rss/cs.CL`)
//! once per run and turns each item into a [`Paper`]. There is no retry: a
//! failed download is reported to the caller, which treats it as run-fatal.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use preprint_alert_shared::{FeedConfig, FeedSource, Paper, PreprintAlertError, Result};

/// User-Agent string for feed requests.
const USER_AGENT: &str = concat!("PreprintAlert/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow when fetching the feed.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// ArxivFeed
// ---------------------------------------------------------------------------

/// [`FeedSource`] backed by an arXiv RSS listing.
pub struct ArxivFeed {
    client: Client,
    url: String,
}

impl ArxivFeed {
    /// Create a feed source from configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PreprintAlertError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl FeedSource for ArxivFeed {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn fetch_today(&self) -> Result<Vec<Paper>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PreprintAlertError::Network(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreprintAlertError::Network(format!(
                "{}: HTTP {status}",
                self.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PreprintAlertError::Network(format!("{}: failed to read body: {e}", self.url)))?;

        let papers = parser::parse_feed(&body)?;
        info!(papers = papers.len(), "feed parsed");

        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed_for(server: &MockServer) -> ArxivFeed {
        let config = FeedConfig {
            url: format!("{}/rss/cs.CL", server.uri()),
            timeout_secs: 5,
        };
        ArxivFeed::new(&config).expect("build feed")
    }

    #[tokio::test]
    async fn fetches_and_parses_feed() {
        let server = MockServer::start().await;
        let body = include_str!("../fixtures/cs-cl.rss.xml");

        Mock::given(method("GET"))
            .and(path("/rss/cs.CL"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let papers = feed_for(&server).fetch_today().await.unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].link, "https://arxiv.org/abs/2401.00001");
    }

    #[tokio::test]
    async fn http_error_is_reported_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rss/cs.CL"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = feed_for(&server).fetch_today().await.unwrap_err();
        assert!(matches!(err, PreprintAlertError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rss/cs.CL"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html"))
            .mount(&server)
            .await;

        let err = feed_for(&server).fetch_today().await.unwrap_err();
        assert!(matches!(err, PreprintAlertError::Parse { .. }));
    }
}
