use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::error::PipelineError;

/// Recipe sites routinely block generic client user agents, so the fetcher
/// presents as a desktop browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Page-fetching seam. Tests substitute canned HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

/// Plain HTTP fetcher. Failures are fatal to the ingestion that issued them;
/// there is no retry at this layer.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }

        let html = response.text().await.map_err(|e| PipelineError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!(url, bytes = html.len(), "Fetched source page");
        Ok(html)
    }
}
