//! Kernel module - storage wiring, built-in scrapers and scheduling.

pub mod scheduled_tasks;
pub mod scrapers;
pub mod store;

pub use scheduled_tasks::{JobOutcome, SchedulerSettings, ScraperScheduler};
pub use scrapers::register_builtin_scrapers;
pub use store::connect_store;
