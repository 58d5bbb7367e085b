//! Built-in scrapers.
//!
//! Each module exposes a `register` function; adding a scraper means adding
//! a module here and one line to [`register_builtin_scrapers`].

pub mod example;
pub mod feed;

use catalog::ScraperRegistry;

use crate::config::Config;

pub use example::ExampleScraper;
pub use feed::FeedScraper;

/// Register every scraper that ships with the server.
pub fn register_builtin_scrapers(registry: &mut ScraperRegistry, config: &Config) {
    example::register(registry);
    feed::register(registry, &config.pricing_feeds);
}
