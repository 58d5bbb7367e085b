// Model Pricing Catalog - API Core
//
// HTTP API over the normalized pricing catalog, plus the scheduler that
// keeps it fresh by running every registered scraper on an interval.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
