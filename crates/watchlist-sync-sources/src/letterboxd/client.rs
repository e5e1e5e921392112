use crate::error::FetchError;
use crate::traits::PageFetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, trace};

const USER_AGENT: &str = concat!("letterplex/", env!("CARGO_PKG_VERSION"));

/// Plain HTTPS fetcher for Letterboxd list and film pages
pub struct LetterboxdHttpClient {
    client: Client,
}

impl LetterboxdHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("text/html,application/xhtml+xml"),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for LetterboxdHttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        trace!("Letterboxd: GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { url: url.to_string() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("failed to read body: {}", e),
        })?;
        debug!("Letterboxd: fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// Turn a site-relative link (`/film/heat-1995/`) into an absolute address
pub fn resolve_link(base_url: &str, href: &str) -> Result<String> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let joined = base
        .join(href.trim())
        .with_context(|| format!("Cannot join {:?} onto {}", href, base_url))?;
    Ok(joined.to_string())
}
