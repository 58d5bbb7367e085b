//! Scraper registry for plugin discovery.
//!
//! The registry maps scraper names (e.g., "example") to factories that
//! construct the scraper. Each built-in scraper module exposes a
//! `register` function that adds itself; the scheduler only ever sees
//! the list returned by [`ScraperRegistry::discover`], so adding a new
//! scraper needs no scheduler changes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ScrapeResult;
use crate::traits::scraper::Scraper;

/// Type alias for a scraper factory.
///
/// Factories run once per [`ScraperRegistry::discover`] call and may fail,
/// e.g. when required configuration is missing.
type BoxedFactory = Box<dyn Fn() -> ScrapeResult<Arc<dyn Scraper>> + Send + Sync>;

struct ScraperRegistration {
    name: String,
    factory: BoxedFactory,
}

/// A constructed scraper, ready to be scheduled.
#[derive(Clone)]
pub struct DiscoveredScraper {
    /// Registered name, used as the unit's identity in logs and reports
    pub name: String,
    pub scraper: Arc<dyn Scraper>,
}

impl std::fmt::Debug for DiscoveredScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredScraper")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry of named scraper factories.
///
/// # Example
///
/// ```ignore
/// let mut registry = ScraperRegistry::new();
/// registry.register("example", || Ok(Arc::new(ExampleScraper) as Arc<dyn Scraper>));
///
/// for unit in registry.discover() {
///     scheduler.add(unit);
/// }
/// ```
#[derive(Default)]
pub struct ScraperRegistry {
    registrations: Vec<ScraperRegistration>,
}

impl ScraperRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scraper factory under `name`.
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> ScrapeResult<Arc<dyn Scraper>> + Send + Sync + 'static,
    {
        let name = name.into();
        let registration = ScraperRegistration {
            name: name.clone(),
            factory: Box::new(factory),
        };

        match self.registrations.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }
    }

    /// Construct every registered scraper.
    ///
    /// A factory that fails or panics is logged and skipped; the others are
    /// still returned.
    pub fn discover(&self) -> Vec<DiscoveredScraper> {
        let mut discovered = Vec::with_capacity(self.registrations.len());

        for registration in &self.registrations {
            match catch_unwind(AssertUnwindSafe(|| (registration.factory)())) {
                Ok(Ok(scraper)) => discovered.push(DiscoveredScraper {
                    name: registration.name.clone(),
                    scraper,
                }),
                Ok(Err(e)) => {
                    warn!(
                        scraper = %registration.name,
                        error = %e,
                        "Failed to construct scraper, skipping"
                    );
                }
                Err(_) => {
                    warn!(
                        scraper = %registration.name,
                        "Scraper factory panicked, skipping"
                    );
                }
            }
        }

        info!(
            registered = self.registrations.len(),
            discovered = discovered.len(),
            "Scraper discovery complete"
        );
        discovered
    }

    /// Check if a scraper name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registrations.iter().any(|r| r.name == name)
    }

    /// Get all registered scraper names.
    pub fn registered_names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::testing::StaticScraper;

    #[test]
    fn test_register_and_check() {
        let mut registry = ScraperRegistry::new();
        registry.register("static", || Ok(Arc::new(StaticScraper::new("static", vec![])) as Arc<dyn Scraper>));

        assert!(registry.is_registered("static"));
        assert!(!registry.is_registered("unknown"));
        assert_eq!(registry.registered_names(), vec!["static"]);
    }

    #[test]
    fn test_failing_factory_is_skipped() {
        let mut registry = ScraperRegistry::new();
        registry.register("broken", || Err(ScrapeError::Construction("missing config".into())));
        registry.register("ok", || Ok(Arc::new(StaticScraper::new("ok", vec![])) as Arc<dyn Scraper>));

        let discovered = registry.discover();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].name, "ok");
    }

    #[test]
    fn test_panicking_factory_is_skipped() {
        let mut registry = ScraperRegistry::new();
        registry.register("exploding", || panic!("factory exploded"));
        registry.register("ok", || Ok(Arc::new(StaticScraper::new("ok", vec![])) as Arc<dyn Scraper>));

        let discovered = registry.discover();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].name, "ok");
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut registry = ScraperRegistry::new();
        registry.register("a", || Err(ScrapeError::Construction("first".into())));
        registry.register("a", || Ok(Arc::new(StaticScraper::new("a", vec![])) as Arc<dyn Scraper>));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.discover().len(), 1);
    }
}
