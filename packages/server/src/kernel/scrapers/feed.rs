//! Feed scraper - reads offering specs published as a JSON array.
//!
//! A feed is either a local file or an http(s) URL. Each configured feed
//! becomes its own scraper, so one unreachable feed never blocks another.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog::error::{ScrapeError, ScrapeResult};
use catalog::{OfferingSpec, Scraper, ScraperRegistry};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
enum FeedSource {
    File(PathBuf),
    Http(String),
}

/// Scraper over one JSON feed location.
#[derive(Debug, Clone)]
pub struct FeedScraper {
    name: String,
    source: FeedSource,
    client: reqwest::Client,
}

impl FeedScraper {
    /// Create a scraper for `location`.
    ///
    /// `http://` and `https://` locations are fetched, `file://` and bare
    /// paths are read from disk. Any other scheme is rejected.
    pub fn new(location: &str) -> ScrapeResult<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ScrapeError::Construction("feed location is empty".to_string()));
        }

        let source = if location.starts_with("http://") || location.starts_with("https://") {
            FeedSource::Http(location.to_string())
        } else if let Some(path) = location.strip_prefix("file://") {
            FeedSource::File(PathBuf::from(path))
        } else if location.contains("://") {
            return Err(ScrapeError::Construction(format!(
                "unsupported feed scheme: {}",
                location
            )));
        } else {
            FeedSource::File(PathBuf::from(location))
        };

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ScrapeError::Construction(e.to_string()))?;

        Ok(Self {
            name: format!("feed:{}", location),
            source,
            client,
        })
    }

    async fn fetch(&self) -> ScrapeResult<String> {
        match &self.source {
            FeedSource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            FeedSource::Http(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ScrapeError::Http(Box::new(e)))?;
                response
                    .text()
                    .await
                    .map_err(|e| ScrapeError::Http(Box::new(e)))
            }
        }
    }
}

#[async_trait]
impl Scraper for FeedScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> ScrapeResult<Vec<OfferingSpec>> {
        let body = self.fetch().await?;
        let specs: Vec<OfferingSpec> = serde_json::from_str(&body)?;
        tracing::debug!(feed = %self.name, count = specs.len(), "Parsed feed");
        Ok(specs)
    }
}

/// Register one feed scraper per location.
pub fn register(registry: &mut ScraperRegistry, locations: &[String]) {
    for location in locations {
        let location = location.clone();
        registry.register(format!("feed:{}", location.trim()), move || {
            FeedScraper::new(&location).map(|s| Arc::new(s) as Arc<dyn Scraper>)
        });
    }
}
