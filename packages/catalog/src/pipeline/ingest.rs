//! Ingestion pipeline - merge scraped offerings into the normalized catalog.
//!
//! Each spec is upserted in its own transaction:
//! 1. Resolve or create the provider by name
//! 2. Resolve or create the model by name
//! 3. Insert the offering, or overwrite every field of the existing one
//! 4. Rebuild its modality set and commit
//!
//! A failing spec is rolled back and recorded; it never affects the
//! specs committed before or after it.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::store::CatalogStore;
use crate::types::spec::OfferingSpec;

/// How one spec was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// A spec that could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestFailure {
    /// Position of the spec in the scraper's output
    pub index: usize,

    pub api_model_name: String,

    pub error: String,
}

/// Result of an ingest operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Number of specs committed
    pub processed: usize,

    /// Offerings inserted for a new (provider, model) pair
    pub created: usize,

    /// Offerings overwritten in place
    pub updated: usize,

    /// Specs that were rolled back
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every spec was committed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total specs seen, committed or not.
    pub fn attempted(&self) -> usize {
        self.processed + self.failures.len()
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        self.processed += 1;
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

/// Upsert every spec from one scraper run.
///
/// Never fails as a whole: per-spec errors are logged and collected in
/// [`IngestReport::failures`].
pub async fn ingest(
    store: &dyn CatalogStore,
    scraper: &str,
    specs: &[OfferingSpec],
) -> IngestReport {
    let mut report = IngestReport::new();

    for (index, spec) in specs.iter().enumerate() {
        match upsert_offering(store, spec).await {
            Ok(outcome) => {
                debug!(
                    scraper = %scraper,
                    api_model_name = %spec.api_model_name,
                    ?outcome,
                    "Upserted offering"
                );
                report.record(outcome);
            }
            Err(e) => {
                warn!(
                    scraper = %scraper,
                    index,
                    api_model_name = %spec.api_model_name,
                    error = %e,
                    "Failed to upsert offering, rolled back"
                );
                report.failures.push(IngestFailure {
                    index,
                    api_model_name: spec.api_model_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        scraper = %scraper,
        processed = report.processed,
        created = report.created,
        updated = report.updated,
        failed = report.failures.len(),
        "Ingest complete"
    );

    report
}

/// Apply one spec in a single transaction.
///
/// Returning early with an error drops the transaction, which rolls back
/// any provider or model created along the way.
pub async fn upsert_offering(store: &dyn CatalogStore, spec: &OfferingSpec) -> Result<UpsertOutcome> {
    let (fields, modalities) = spec.to_fields()?;

    let mut tx = store.begin().await?;
    let provider = tx.ensure_provider(&spec.new_provider()).await?;
    let model = tx.ensure_model(spec.model_name.trim()).await?;

    let (id, outcome) = match tx.find_offering_id(provider.id, model.id).await? {
        Some(id) => {
            tx.update_offering(id, &fields).await?;
            (id, UpsertOutcome::Updated)
        }
        None => {
            let id = tx.insert_offering(provider.id, model.id, &fields).await?;
            (id, UpsertOutcome::Created)
        }
    };

    tx.replace_modalities(id, &modalities).await?;
    tx.commit().await?;

    Ok(outcome)
}
