//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{CatalogError, Result};
use crate::traits::store::{CatalogStore, CatalogTransaction};
use crate::types::{
    filter::OfferingFilter,
    id::{ModelId, OfferingId, ProviderId},
    modality::ModalitySet,
    offering::{
        CatalogCounts, Model, NewProvider, Offering, OfferingFields, OfferingView, Provider,
    },
};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    providers: BTreeMap<ProviderId, Provider>,
    models: BTreeMap<ModelId, Model>,
    offerings: BTreeMap<OfferingId, Offering>,
    last_provider_id: i64,
    last_model_id: i64,
    last_offering_id: i64,
}

impl CatalogState {
    fn view(&self, offering: &Offering) -> OfferingView {
        OfferingView {
            offering: offering.clone(),
            provider_name: self
                .providers
                .get(&offering.provider_id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            model_name: self
                .models
                .get(&offering.model_id)
                .map(|m| m.name.clone())
                .unwrap_or_default(),
        }
    }

    fn ensure_api_name_free(&self, api_model_name: &str, owner: Option<OfferingId>) -> Result<()> {
        let taken = self
            .offerings
            .values()
            .any(|o| o.api_model_name == api_model_name && Some(o.id) != owner);
        if taken {
            return Err(CatalogError::Conflict(format!(
                "api_model_name already in use: {api_model_name}"
            )));
        }
        Ok(())
    }
}

/// In-memory catalog.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart. Transactions hold the state lock for their
/// whole lifetime, so writers are fully serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A transaction over a working copy of the state.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    working: CatalogState,
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn ensure_provider(&mut self, input: &NewProvider) -> Result<Provider> {
        if let Some(existing) = self.working.providers.values().find(|p| p.name == input.name) {
            return Ok(existing.clone());
        }
        self.working.last_provider_id += 1;
        let provider = Provider {
            id: ProviderId::new(self.working.last_provider_id),
            name: input.name.clone(),
            website: input.website.clone(),
            api_key_name: input.api_key_name.clone(),
        };
        self.working.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn ensure_model(&mut self, name: &str) -> Result<Model> {
        if let Some(existing) = self.working.models.values().find(|m| m.name == name) {
            return Ok(existing.clone());
        }
        self.working.last_model_id += 1;
        let model = Model {
            id: ModelId::new(self.working.last_model_id),
            name: name.to_string(),
        };
        self.working.models.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_offering_id(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
    ) -> Result<Option<OfferingId>> {
        Ok(self
            .working
            .offerings
            .values()
            .find(|o| o.provider_id == provider_id && o.model_id == model_id)
            .map(|o| o.id))
    }

    async fn insert_offering(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
        fields: &OfferingFields,
    ) -> Result<OfferingId> {
        if !self.working.providers.contains_key(&provider_id) {
            return Err(CatalogError::NotFound {
                entity: "provider",
                key: provider_id.to_string(),
            });
        }
        if !self.working.models.contains_key(&model_id) {
            return Err(CatalogError::NotFound {
                entity: "model",
                key: model_id.to_string(),
            });
        }
        if self.find_offering_id(provider_id, model_id).await?.is_some() {
            return Err(CatalogError::Conflict(format!(
                "offering already exists for provider {provider_id} and model {model_id}"
            )));
        }
        self.working.ensure_api_name_free(&fields.api_model_name, None)?;

        self.working.last_offering_id += 1;
        let id = OfferingId::new(self.working.last_offering_id);
        let offering = Offering::from_parts(id, provider_id, model_id, fields.clone(), ModalitySet::new());
        self.working.offerings.insert(id, offering);
        Ok(id)
    }

    async fn update_offering(&mut self, id: OfferingId, fields: &OfferingFields) -> Result<()> {
        self.working.ensure_api_name_free(&fields.api_model_name, Some(id))?;
        let offering = self
            .working
            .offerings
            .get_mut(&id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: "offering",
                key: id.to_string(),
            })?;
        offering.overwrite(fields.clone());
        Ok(())
    }

    async fn replace_modalities(&mut self, id: OfferingId, modalities: &ModalitySet) -> Result<()> {
        let offering = self
            .working
            .offerings
            .get_mut(&id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: "offering",
                key: id.to_string(),
            })?;
        offering.modalities.replace(modalities.iter());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, skip: usize, limit: usize) -> Vec<T> {
    items.skip(skip).take(limit).collect()
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>> {
        Ok(self.state.lock().await.providers.get(&id).cloned())
    }

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>> {
        let state = self.state.lock().await;
        Ok(state.providers.values().find(|p| p.name == name).cloned())
    }

    async fn list_providers(&self, skip: usize, limit: usize) -> Result<Vec<Provider>> {
        let state = self.state.lock().await;
        Ok(page(state.providers.values().cloned(), skip, limit))
    }

    async fn get_model(&self, id: ModelId) -> Result<Option<Model>> {
        Ok(self.state.lock().await.models.get(&id).cloned())
    }

    async fn find_model_by_name(&self, name: &str) -> Result<Option<Model>> {
        let state = self.state.lock().await;
        Ok(state.models.values().find(|m| m.name == name).cloned())
    }

    async fn list_models(&self, skip: usize, limit: usize) -> Result<Vec<Model>> {
        let state = self.state.lock().await;
        Ok(page(state.models.values().cloned(), skip, limit))
    }

    async fn get_offering(&self, id: OfferingId) -> Result<Option<OfferingView>> {
        let state = self.state.lock().await;
        Ok(state.offerings.get(&id).map(|o| state.view(o)))
    }

    async fn find_offerings(&self, filter: &OfferingFilter) -> Result<Vec<OfferingView>> {
        let state = self.state.lock().await;
        let mut views: Vec<_> = state
            .offerings
            .values()
            .filter(|o| filter.matches(o))
            .map(|o| state.view(o))
            .collect();
        views.sort_by(|a, b| {
            a.offering
                .average_cost_per_mtok()
                .total_cmp(&b.offering.average_cost_per_mtok())
                .then(a.offering.id.cmp(&b.offering.id))
        });
        Ok(views)
    }

    async fn find_offerings_by_api_names(
        &self,
        api_model_names: &[String],
    ) -> Result<Vec<OfferingView>> {
        let state = self.state.lock().await;
        let mut views: Vec<_> = state
            .offerings
            .values()
            .filter(|o| o.is_active && api_model_names.contains(&o.api_model_name))
            .map(|o| state.view(o))
            .collect();
        let combined = |v: &OfferingView| v.offering.input_cost_per_mtok + v.offering.output_cost_per_mtok;
        views.sort_by(|a, b| {
            combined(a)
                .total_cmp(&combined(b))
                .then(a.offering.id.cmp(&b.offering.id))
        });
        Ok(views)
    }

    async fn list_active_api_names(&self) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .offerings
            .values()
            .filter(|o| o.is_active)
            .map(|o| o.api_model_name.clone())
            .collect())
    }

    async fn counts(&self) -> Result<CatalogCounts> {
        let state = self.state.lock().await;
        Ok(CatalogCounts {
            providers: state.providers.len() as u64,
            models: state.models.len() as u64,
            offerings: state.offerings.len() as u64,
        })
    }
}
