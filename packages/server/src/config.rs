use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://./database.db";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Period of the recurring scrape trigger
    pub schedule_interval_mins: u64,
    /// Fire every scraper once as soon as the scheduler starts
    pub run_on_startup: bool,
    /// Informational; interval triggers do not depend on it
    pub timezone: String,
    pub log_level: String,
    /// JSON feed locations, one feed scraper each
    pub pricing_feeds: Vec<String>,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let schedule_interval_mins: u64 = lookup("SCHEDULE_INTERVAL_MINS")
            .unwrap_or_else(|| "1440".to_string())
            .trim()
            .parse()
            .context("SCHEDULE_INTERVAL_MINS must be a valid number")?;
        if schedule_interval_mins == 0 {
            bail!("SCHEDULE_INTERVAL_MINS must be greater than zero");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .trim()
                .parse()
                .context("PORT must be a valid number")?,
            schedule_interval_mins,
            run_on_startup: lookup("RUN_ON_STARTUP")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            timezone: lookup("TIMEZONE").unwrap_or_else(|| "UTC".to_string()),
            log_level: lookup("LOG_LEVEL")
                .unwrap_or_else(|| "INFO".to_string())
                .to_uppercase(),
            pricing_feeds: lookup("PRICING_FEEDS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        })
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_mins * 60)
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        format!("{},sqlx=warn", self.log_level.to_lowercase())
    }
}

/// `true`, `1` and `t` (any case) enable a flag; anything else disables it.
fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "t")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
