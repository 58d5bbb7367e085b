//! Row types shared by the SQL backends.

use sqlx::FromRow;

use crate::error::{CatalogError, Result};
use crate::types::{
    id::{ModelId, OfferingId, ProviderId},
    modality::ModalitySet,
    offering::{DiscountWindow, Model, Offering, OfferingView, Provider},
};

#[derive(Debug, FromRow)]
pub(crate) struct ProviderRow {
    id: i64,
    name: String,
    website: String,
    api_key_name: Option<String>,
}

impl ProviderRow {
    pub(crate) fn into_provider(self) -> Provider {
        Provider {
            id: ProviderId::new(self.id),
            name: self.name,
            website: self.website,
            api_key_name: self.api_key_name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ModelRow {
    id: i64,
    name: String,
}

impl ModelRow {
    pub(crate) fn into_model(self) -> Model {
        Model {
            id: ModelId::new(self.id),
            name: self.name,
        }
    }
}

/// An offering joined with its provider and model names.
/// `modalities` is the comma-joined aggregate of its modality rows.
#[derive(Debug, FromRow)]
pub(crate) struct OfferingRow {
    id: i64,
    provider_id: i64,
    model_id: i64,
    api_model_name: String,
    context_window: i64,
    max_output_tokens: Option<i64>,
    input_cost_per_mtok: f64,
    output_cost_per_mtok: f64,
    cached_input_cost_per_mtok: Option<f64>,
    tokens_per_second: Option<f64>,
    supports_tools: bool,
    discount_start_time_utc: String,
    discount_end_time_utc: String,
    input_discount_price: f64,
    output_discount_price: f64,
    is_active: bool,
    modalities: Option<String>,
    provider_name: String,
    model_name: String,
}

impl OfferingRow {
    pub(crate) fn into_view(self) -> Result<OfferingView> {
        let discount = DiscountWindow::parse(
            &self.discount_start_time_utc,
            &self.discount_end_time_utc,
            self.input_discount_price,
            self.output_discount_price,
        )
        .map_err(|e| CatalogError::storage(format!("Invalid discount window: {}", e)))?;

        let modalities = ModalitySet::parse_joined(self.modalities.as_deref())?;

        Ok(OfferingView {
            offering: Offering {
                id: OfferingId::new(self.id),
                provider_id: ProviderId::new(self.provider_id),
                model_id: ModelId::new(self.model_id),
                api_model_name: self.api_model_name,
                context_window: narrow(self.context_window)?,
                max_output_tokens: self.max_output_tokens.map(narrow).transpose()?,
                input_cost_per_mtok: self.input_cost_per_mtok,
                output_cost_per_mtok: self.output_cost_per_mtok,
                cached_input_cost_per_mtok: self.cached_input_cost_per_mtok,
                tokens_per_second: self.tokens_per_second,
                modalities,
                supports_tools: self.supports_tools,
                discount,
                is_active: self.is_active,
            },
            provider_name: self.provider_name,
            model_name: self.model_name,
        })
    }
}

fn narrow(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| CatalogError::storage(format!("Token count out of range: {}", value)))
}

#[derive(Debug, FromRow)]
pub(crate) struct CountsRow {
    pub providers: i64,
    pub models: i64,
    pub offerings: i64,
}

/// Columns selected for every offering read. `$aggregate` is the
/// backend's comma-joining aggregate over `offering_modalities.modality`.
macro_rules! offering_select {
    ($aggregate:literal) => {
        concat!(
            "SELECT o.id, o.provider_id, o.model_id, o.api_model_name, o.context_window, ",
            "o.max_output_tokens, o.input_cost_per_mtok, o.output_cost_per_mtok, ",
            "o.cached_input_cost_per_mtok, o.tokens_per_second, o.supports_tools, ",
            "o.discount_start_time_utc, o.discount_end_time_utc, o.input_discount_price, ",
            "o.output_discount_price, o.is_active, ",
            "(SELECT ",
            $aggregate,
            " FROM offering_modalities om WHERE om.offering_id = o.id) AS modalities, ",
            "p.name AS provider_name, m.name AS model_name ",
            "FROM offerings o ",
            "JOIN providers p ON p.id = o.provider_id ",
            "JOIN models m ON m.id = o.model_id"
        )
    };
}

pub(crate) use offering_select;
