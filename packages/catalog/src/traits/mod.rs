//! Core trait abstractions for the catalog library.
//!
//! These traits define the interfaces that applications implement
//! to provide storage and extraction capabilities.

pub mod scraper;
pub mod store;
