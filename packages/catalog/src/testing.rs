//! Testing utilities including mock scrapers.
//!
//! These are useful for testing the scheduler and ingestion paths
//! without making real network calls.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ScrapeError, ScrapeResult};
use crate::traits::scraper::Scraper;
use crate::types::spec::OfferingSpec;

/// A scraper that returns a fixed list of specs.
///
/// Counts its calls and can be slowed down to exercise overlap handling.
#[derive(Debug, Clone)]
pub struct StaticScraper {
    name: String,
    specs: Vec<OfferingSpec>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticScraper {
    pub fn new(name: impl Into<String>, specs: Vec<OfferingSpec>) -> Self {
        Self {
            name: name.into(),
            specs,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `scrape` has been entered.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for StaticScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> ScrapeResult<Vec<OfferingSpec>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.specs.clone())
    }
}

/// How a [`FailingScraper`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Return a `ScrapeError`
    Error,
    /// Panic inside `scrape`
    Panic,
}

/// A scraper that always fails.
#[derive(Debug, Clone)]
pub struct FailingScraper {
    name: String,
    mode: FailureMode,
    calls: Arc<AtomicUsize>,
}

impl FailingScraper {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Error,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn panicking(name: impl Into<String>) -> Self {
        Self {
            mode: FailureMode::Panic,
            ..Self::new(name)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for FailingScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> ScrapeResult<Vec<OfferingSpec>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            FailureMode::Error => Err(ScrapeError::Parse(format!("{} source unavailable", self.name))),
            FailureMode::Panic => panic!("{} exploded", self.name),
        }
    }
}

/// A valid text-only spec with the given names and pricing.
pub fn offering_spec(provider: &str, model: &str, api_model_name: &str, input: f64, output: f64) -> OfferingSpec {
    OfferingSpec::new(
        provider,
        format!("https://{}.example", provider.to_lowercase()),
        model,
        api_model_name,
    )
    .with_context_window(8000)
    .with_pricing(input, output)
}
