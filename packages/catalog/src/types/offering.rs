//! Normalized catalog entities: providers, models and offerings.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::id::{ModelId, OfferingId, ProviderId};
use super::modality::ModalitySet;

/// An organization offering compute models. `name` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub website: String,
    /// Name of the credential (e.g. env var) used to call this provider.
    pub api_key_name: Option<String>,
}

/// Input for creating a provider on first encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProvider {
    pub name: String,
    pub website: String,
    pub api_key_name: Option<String>,
}

/// A provider-independent conceptual model, e.g. "Claude 3 Opus".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
}

/// Time-windowed discount pricing.
///
/// Persisted and exposed as-is; cost comparison never reads it.
/// `00:00`/`00:00` with zero prices means "no discount".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountWindow {
    #[serde(with = "hhmm")]
    pub start_time_utc: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time_utc: NaiveTime,
    pub input_price: f64,
    pub output_price: f64,
}

impl Default for DiscountWindow {
    fn default() -> Self {
        Self {
            start_time_utc: NaiveTime::MIN,
            end_time_utc: NaiveTime::MIN,
            input_price: 0.0,
            output_price: 0.0,
        }
    }
}

impl DiscountWindow {
    /// Build a window from two UTC `HH:MM` strings.
    pub fn parse(
        start: &str,
        end: &str,
        input_price: f64,
        output_price: f64,
    ) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start_time_utc: NaiveTime::parse_from_str(start, hhmm::FORMAT)?,
            end_time_utc: NaiveTime::parse_from_str(end, hhmm::FORMAT)?,
            input_price,
            output_price,
        })
    }

    pub fn start_hhmm(&self) -> String {
        self.start_time_utc.format(hhmm::FORMAT).to_string()
    }

    pub fn end_hhmm(&self) -> String {
        self.end_time_utc.format(hhmm::FORMAT).to_string()
    }

    pub fn is_active_discount(&self) -> bool {
        self.start_time_utc != self.end_time_utc
            || self.input_price > 0.0
            || self.output_price > 0.0
    }
}

/// Every offering column that an upsert overwrites, apart from modalities.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferingFields {
    pub api_model_name: String,
    pub context_window: i32,
    pub max_output_tokens: Option<i32>,
    pub input_cost_per_mtok: f64,
    pub output_cost_per_mtok: f64,
    pub cached_input_cost_per_mtok: Option<f64>,
    pub tokens_per_second: Option<f64>,
    pub supports_tools: bool,
    pub discount: DiscountWindow,
    pub is_active: bool,
}

/// A provider's priced instance of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub id: OfferingId,
    pub provider_id: ProviderId,
    pub model_id: ModelId,
    pub api_model_name: String,
    pub context_window: i32,
    pub max_output_tokens: Option<i32>,
    pub input_cost_per_mtok: f64,
    pub output_cost_per_mtok: f64,
    pub cached_input_cost_per_mtok: Option<f64>,
    pub tokens_per_second: Option<f64>,
    pub modalities: ModalitySet,
    pub supports_tools: bool,
    pub discount: DiscountWindow,
    pub is_active: bool,
}

impl Offering {
    pub fn from_parts(
        id: OfferingId,
        provider_id: ProviderId,
        model_id: ModelId,
        fields: OfferingFields,
        modalities: ModalitySet,
    ) -> Self {
        Self {
            id,
            provider_id,
            model_id,
            api_model_name: fields.api_model_name,
            context_window: fields.context_window,
            max_output_tokens: fields.max_output_tokens,
            input_cost_per_mtok: fields.input_cost_per_mtok,
            output_cost_per_mtok: fields.output_cost_per_mtok,
            cached_input_cost_per_mtok: fields.cached_input_cost_per_mtok,
            tokens_per_second: fields.tokens_per_second,
            modalities,
            supports_tools: fields.supports_tools,
            discount: fields.discount,
            is_active: fields.is_active,
        }
    }

    /// Overwrite every field in place, keeping the surrogate identity.
    pub fn overwrite(&mut self, fields: OfferingFields) {
        self.api_model_name = fields.api_model_name;
        self.context_window = fields.context_window;
        self.max_output_tokens = fields.max_output_tokens;
        self.input_cost_per_mtok = fields.input_cost_per_mtok;
        self.output_cost_per_mtok = fields.output_cost_per_mtok;
        self.cached_input_cost_per_mtok = fields.cached_input_cost_per_mtok;
        self.tokens_per_second = fields.tokens_per_second;
        self.supports_tools = fields.supports_tools;
        self.discount = fields.discount;
        self.is_active = fields.is_active;
    }

    /// Average of input and output cost per million tokens.
    pub fn average_cost_per_mtok(&self) -> f64 {
        (self.input_cost_per_mtok + self.output_cost_per_mtok) / 2.0
    }

    pub fn input_price_per_token(&self) -> f64 {
        self.input_cost_per_mtok / 1_000_000.0
    }

    pub fn output_price_per_token(&self) -> f64 {
        self.output_cost_per_mtok / 1_000_000.0
    }
}

/// An offering joined with the names of its owning provider and model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingView {
    #[serde(flatten)]
    pub offering: Offering,
    pub provider_name: String,
    pub model_name: String,
}

/// Row counts per entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub providers: u64,
    pub models: u64,
    pub offerings: u64,
}

/// `HH:MM` (de)serialization for discount window bounds.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
