//! Storage traits for the normalized catalog.
//!
//! The storage layer is split in two:
//! - `CatalogStore`: read operations plus a factory for write transactions
//! - `CatalogTransaction`: create/update primitives scoped to one unit of work
//!
//! Every write goes through a transaction. Dropping a transaction without
//! calling [`CatalogTransaction::commit`] rolls it back.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    filter::OfferingFilter,
    id::{ModelId, OfferingId, ProviderId},
    modality::ModalitySet,
    offering::{CatalogCounts, Model, NewProvider, OfferingFields, OfferingView, Provider},
};

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Write primitives available inside one transaction.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Return the provider named `input.name`, creating it if absent.
    ///
    /// An existing provider's website and credential name are left untouched.
    async fn ensure_provider(&mut self, input: &NewProvider) -> Result<Provider>;

    /// Return the model named `name`, creating it if absent.
    async fn ensure_model(&mut self, name: &str) -> Result<Model>;

    /// Find the offering for a (provider, model) pair.
    async fn find_offering_id(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
    ) -> Result<Option<OfferingId>>;

    /// Insert a new offering row (without modalities).
    async fn insert_offering(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
        fields: &OfferingFields,
    ) -> Result<OfferingId>;

    /// Overwrite every column of an existing offering.
    async fn update_offering(&mut self, id: OfferingId, fields: &OfferingFields) -> Result<()>;

    /// Clear the offering's modalities and rebuild them from `modalities`.
    async fn replace_modalities(&mut self, id: OfferingId, modalities: &ModalitySet) -> Result<()>;

    /// Make every write in this transaction visible atomically.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Read side of the catalog plus the transaction factory.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Open a write transaction.
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>>;

    async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>>;

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>>;

    async fn list_providers(&self, skip: usize, limit: usize) -> Result<Vec<Provider>>;

    async fn get_model(&self, id: ModelId) -> Result<Option<Model>>;

    async fn find_model_by_name(&self, name: &str) -> Result<Option<Model>>;

    async fn list_models(&self, skip: usize, limit: usize) -> Result<Vec<Model>>;

    async fn get_offering(&self, id: OfferingId) -> Result<Option<OfferingView>>;

    /// Offerings matching `filter`, cheapest average cost first.
    async fn find_offerings(&self, filter: &OfferingFilter) -> Result<Vec<OfferingView>>;

    /// Active offerings whose api name is in `api_model_names`,
    /// ordered by input + output cost ascending.
    async fn find_offerings_by_api_names(
        &self,
        api_model_names: &[String],
    ) -> Result<Vec<OfferingView>>;

    /// Api names of every active offering.
    async fn list_active_api_names(&self) -> Result<Vec<String>>;

    async fn counts(&self) -> Result<CatalogCounts>;
}

