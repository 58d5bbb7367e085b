//! A scraper that returns fixed data, useful for smoke-testing a deployment.

use async_trait::async_trait;
use std::sync::Arc;

use catalog::error::ScrapeResult;
use catalog::{Modality, OfferingSpec, Scraper, ScraperRegistry};

pub const NAME: &str = "example";

/// Two hard-coded offerings from a fictional provider.
#[derive(Debug, Clone, Default)]
pub struct ExampleScraper;

#[async_trait]
impl Scraper for ExampleScraper {
    fn name(&self) -> &str {
        NAME
    }

    async fn scrape(&self) -> ScrapeResult<Vec<OfferingSpec>> {
        Ok(vec![
            OfferingSpec::new(
                "ExampleProvider",
                "https://example.com",
                "ExampleModel-1",
                "example/model-1",
            )
            .with_context_window(8000)
            .with_max_output_tokens(4096)
            .with_pricing(0.50, 1.50)
            .with_tokens_per_second(150.0)
            .with_modalities([Modality::Text, Modality::Image]),
            OfferingSpec::new(
                "ExampleProvider",
                "https://example.com",
                "ExampleModel-2-Large",
                "example/model-2-large-context",
            )
            .with_context_window(128_000)
            .with_max_output_tokens(8192)
            .with_pricing(3.00, 6.00)
            .with_tokens_per_second(100.0)
            .with_modalities([Modality::Text, Modality::Image])
            .with_tools(true),
        ])
    }
}

pub fn register(registry: &mut ScraperRegistry) {
    registry.register(NAME, || Ok(Arc::new(ExampleScraper) as Arc<dyn Scraper>));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_example_specs_are_valid() {
        let specs = ExampleScraper.scrape().await.unwrap();
        assert_eq!(specs.len(), 2);
        for spec in &specs {
            assert!(spec.to_fields().is_ok(), "{}", spec.api_model_name);
        }
        assert!(specs[1].supports_tools);
    }
}
