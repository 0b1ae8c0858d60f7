//! Paper content fetcher.
//!
//! Downloads a paper's HTML rendering (`<html_base_url>/<id>`), extracts the
//! article as Markdown, and cuts a bounded methodology excerpt from it.
//! Not every paper has an HTML rendering; a 404 is reported as
//! [`FetchError::Unavailable`] so the pipeline can fall back to the abstract.

mod extract;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use preprint_alert_shared::{
    ContentFetcher, ExtendedContent, FetchError, FetcherConfig, PaperId, PreprintAlertError,
    Result,
};

pub use extract::{
    FALLBACK_MAX_CHARS, METHODOLOGY_MAX_CHARS, extract_article, methodology_excerpt,
};

/// User-Agent string for content requests.
const USER_AGENT: &str = concat!("PreprintAlert/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// [`ContentFetcher`] for arXiv HTML renderings.
pub struct ArxivHtmlFetcher {
    client: Client,
    html_base_url: String,
}

impl ArxivHtmlFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PreprintAlertError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            html_base_url: config.html_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, id: &PaperId) -> String {
        format!("{}/{id}", self.html_base_url)
    }
}

#[async_trait]
impl ContentFetcher for ArxivHtmlFetcher {
    #[instrument(skip(self), fields(id = %id))]
    async fn fetch(&self, id: &PaperId) -> std::result::Result<ExtendedContent, FetchError> {
        let url = self.url_for(id);
        debug!(%url, "fetching paper HTML");

        let network = |message: String| FetchError::Network {
            id: id.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::Unavailable { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(network(format!("{url}: HTTP {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| network(format!("{url}: failed to read body: {e}")))?;

        let text = extract_article(&html).ok_or_else(|| FetchError::Parse {
            id: id.to_string(),
            message: "page has no extractable text".into(),
        })?;
        let methodology = methodology_excerpt(&text);

        debug!(
            text_len = text.len(),
            excerpt_len = methodology.len(),
            "paper content extracted"
        );

        Ok(ExtendedContent {
            source_url: url,
            text,
            methodology,
        })
    }
}
