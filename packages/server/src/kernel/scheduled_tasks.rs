//! Scheduled scraping using tokio-cron-scheduler.
//!
//! Every discovered scraper becomes an independent scheduled unit with a
//! recurring interval trigger and, optionally, a one-shot trigger that fires
//! as soon as the scheduler starts.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (every SCHEDULE_INTERVAL_MINS)
//!     │
//!     └─► For each unit → run_job()
//!             ├─► already running? → skip this trigger
//!             └─► spawn: scraper.scrape() → catalog::ingest()
//! ```
//!
//! A unit that errors or panics is logged and reported; the other units and
//! the scheduler itself keep running.

use anyhow::Result;
use futures::future::join_all;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use catalog::error::ScrapeError;
use catalog::{ingest, CatalogStore, DiscoveredScraper, IngestReport, Scraper};

use crate::config::Config;

/// Trigger configuration shared by every unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub run_on_startup: bool,
    pub timezone: String,
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.schedule_interval(),
            run_on_startup: config.run_on_startup,
            timezone: config.timezone.clone(),
        }
    }
}

/// What happened to one trigger of one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// A previous run of the same unit was still in progress
    Skipped,
    /// The scraper errored or panicked; nothing was ingested
    Failed(String),
    Completed(IngestReport),
}

#[derive(Clone)]
struct ScheduledUnit {
    name: String,
    scraper: Arc<dyn Scraper>,
    running: Arc<Mutex<()>>,
}

/// Runs discovered scrapers on a fixed interval and ingests their output.
pub struct ScraperScheduler {
    store: Arc<dyn CatalogStore>,
    units: Vec<ScheduledUnit>,
    settings: SchedulerSettings,
    scheduler: Option<JobScheduler>,
}

impl ScraperScheduler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        discovered: Vec<DiscoveredScraper>,
        settings: SchedulerSettings,
    ) -> Self {
        let units = discovered
            .into_iter()
            .map(|d| ScheduledUnit {
                name: d.name,
                scraper: d.scraper,
                running: Arc::new(Mutex::new(())),
            })
            .collect();

        Self {
            store,
            units,
            settings,
            scheduler: None,
        }
    }

    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }

    /// Register triggers for every unit and start firing them.
    pub async fn start(&mut self) -> Result<()> {
        let scheduler = JobScheduler::new().await?;

        for unit in &self.units {
            if self.settings.run_on_startup {
                let store = self.store.clone();
                let unit = unit.clone();
                let job = Job::new_one_shot_async(Duration::ZERO, move |_uuid, _lock| {
                    fire(store.clone(), unit.clone())
                })?;
                scheduler.add(job).await?;
            }

            let store = self.store.clone();
            let unit = unit.clone();
            let job = Job::new_repeated_async(self.settings.interval, move |_uuid, _lock| {
                fire(store.clone(), unit.clone())
            })?;
            scheduler.add(job).await?;
        }

        scheduler.start().await?;

        tracing::info!(
            units = self.units.len(),
            interval_secs = self.settings.interval.as_secs(),
            run_on_startup = self.settings.run_on_startup,
            timezone = %self.settings.timezone,
            "Scraper scheduler started"
        );

        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Stop firing triggers. Runs already in progress finish on their own.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown().await?;
            tracing::info!("Scraper scheduler stopped");
        }
        Ok(())
    }

    /// Trigger every unit once, concurrently, and wait for all of them.
    pub async fn run_cycle(&self) -> Vec<(String, JobOutcome)> {
        let runs = self.units.iter().map(|unit| {
            let store = self.store.clone();
            let unit = unit.clone();
            async move {
                let name = unit.name.clone();
                (name, run_job(store, unit).await)
            }
        });
        join_all(runs).await
    }

    /// Trigger one unit by name. `None` if no such unit exists.
    pub async fn run_unit(&self, name: &str) -> Option<JobOutcome> {
        let unit = self.units.iter().find(|u| u.name == name)?.clone();
        Some(run_job(self.store.clone(), unit).await)
    }
}

fn fire(store: Arc<dyn CatalogStore>, unit: ScheduledUnit) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        run_job(store, unit).await;
    })
}

/// Run one scrape-and-ingest job for `unit`.
///
/// The scrape runs in its own task so a panic surfaces as a join error
/// instead of unwinding into the scheduler.
async fn run_job(store: Arc<dyn CatalogStore>, unit: ScheduledUnit) -> JobOutcome {
    let Ok(_running) = unit.running.clone().try_lock_owned() else {
        tracing::warn!(scraper = %unit.name, "Previous run still in progress, skipping trigger");
        return JobOutcome::Skipped;
    };

    let run_id = Uuid::now_v7();
    let started = Instant::now();
    tracing::info!(scraper = %unit.name, %run_id, "Scrape job started");

    let scraper = unit.scraper.clone();
    let name = unit.name.clone();
    let task = tokio::spawn(async move {
        let specs = scraper.scrape().await?;
        tracing::info!(scraper = %name, offerings = specs.len(), "Scraped offerings");
        Ok::<_, ScrapeError>(ingest(store.as_ref(), &name, &specs).await)
    });

    let outcome = match task.await {
        Ok(Ok(report)) => JobOutcome::Completed(report),
        Ok(Err(e)) => JobOutcome::Failed(e.to_string()),
        Err(join_error) => JobOutcome::Failed(ScrapeError::Aborted(join_error.to_string()).to_string()),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        JobOutcome::Completed(report) => tracing::info!(
            scraper = %unit.name,
            %run_id,
            elapsed_ms,
            processed = report.processed,
            failed = report.failures.len(),
            "Scrape job finished"
        ),
        JobOutcome::Failed(error) => tracing::error!(
            scraper = %unit.name,
            %run_id,
            elapsed_ms,
            error = %error,
            "Scrape job failed"
        ),
        JobOutcome::Skipped => {}
    }

    outcome
}
