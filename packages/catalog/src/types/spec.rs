//! The record a scraper hands to the ingestion pipeline.

use serde::{Deserialize, Serialize};

use super::modality::{Modality, ModalitySet};
use super::offering::{DiscountWindow, NewProvider, OfferingFields};
use crate::error::CatalogError;

fn default_discount_time() -> String {
    "00:00".to_string()
}

fn default_true() -> bool {
    true
}

/// One offering as extracted from a source, before normalization.
///
/// Carries the provider and model by name; ingestion resolves them to rows.
/// Deserializable so feeds can ship specs as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingSpec {
    pub provider_name: String,
    #[serde(default)]
    pub provider_api_key_name: Option<String>,
    pub provider_website: String,
    pub model_name: String,
    pub api_model_name: String,
    pub context_window: i32,
    #[serde(default)]
    pub max_output_tokens: Option<i32>,
    pub input_cost_per_mtok: f64,
    pub output_cost_per_mtok: f64,
    #[serde(default)]
    pub cached_input_cost_per_mtok: Option<f64>,
    #[serde(default)]
    pub tokens_per_second: Option<f64>,
    pub modalities: Vec<Modality>,
    #[serde(default)]
    pub supports_tools: bool,
    #[serde(default = "default_discount_time")]
    pub discount_start_time_utc: String,
    #[serde(default = "default_discount_time")]
    pub discount_end_time_utc: String,
    #[serde(default)]
    pub input_discount_price: f64,
    #[serde(default)]
    pub output_discount_price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl OfferingSpec {
    /// Start a text-only spec with zero pricing; refine with the `with_*` setters.
    pub fn new(
        provider_name: impl Into<String>,
        provider_website: impl Into<String>,
        model_name: impl Into<String>,
        api_model_name: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            provider_api_key_name: None,
            provider_website: provider_website.into(),
            model_name: model_name.into(),
            api_model_name: api_model_name.into(),
            context_window: 0,
            max_output_tokens: None,
            input_cost_per_mtok: 0.0,
            output_cost_per_mtok: 0.0,
            cached_input_cost_per_mtok: None,
            tokens_per_second: None,
            modalities: vec![Modality::Text],
            supports_tools: false,
            discount_start_time_utc: default_discount_time(),
            discount_end_time_utc: default_discount_time(),
            input_discount_price: 0.0,
            output_discount_price: 0.0,
            is_active: true,
        }
    }

    pub fn with_api_key_name(mut self, name: impl Into<String>) -> Self {
        self.provider_api_key_name = Some(name.into());
        self
    }

    pub fn with_context_window(mut self, tokens: i32) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: i32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_pricing(mut self, input_per_mtok: f64, output_per_mtok: f64) -> Self {
        self.input_cost_per_mtok = input_per_mtok;
        self.output_cost_per_mtok = output_per_mtok;
        self
    }

    pub fn with_cached_input_cost(mut self, per_mtok: f64) -> Self {
        self.cached_input_cost_per_mtok = Some(per_mtok);
        self
    }

    pub fn with_tokens_per_second(mut self, tps: f64) -> Self {
        self.tokens_per_second = Some(tps);
        self
    }

    pub fn with_modalities(mut self, modalities: impl IntoIterator<Item = Modality>) -> Self {
        self.modalities = modalities.into_iter().collect();
        self
    }

    pub fn with_tools(mut self, supports_tools: bool) -> Self {
        self.supports_tools = supports_tools;
        self
    }

    pub fn with_discount(
        mut self,
        start_utc: impl Into<String>,
        end_utc: impl Into<String>,
        input_price: f64,
        output_price: f64,
    ) -> Self {
        self.discount_start_time_utc = start_utc.into();
        self.discount_end_time_utc = end_utc.into();
        self.input_discount_price = input_price;
        self.output_discount_price = output_price;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Provider row to create if none exists under `provider_name`.
    pub fn new_provider(&self) -> NewProvider {
        NewProvider {
            name: self.provider_name.trim().to_string(),
            website: self.provider_website.clone(),
            api_key_name: self.provider_api_key_name.clone(),
        }
    }

    /// Validate and normalize into the fields an upsert writes.
    pub fn to_fields(&self) -> Result<(OfferingFields, ModalitySet), CatalogError> {
        require_text("provider_name", &self.provider_name)?;
        require_text("model_name", &self.model_name)?;
        require_text("api_model_name", &self.api_model_name)?;

        if self.context_window <= 0 {
            return Err(self.invalid(format!(
                "context_window must be positive, got {}",
                self.context_window
            )));
        }
        if let Some(max) = self.max_output_tokens {
            if max <= 0 {
                return Err(self.invalid(format!("max_output_tokens must be positive, got {max}")));
            }
        }

        self.require_price("input_cost_per_mtok", self.input_cost_per_mtok)?;
        self.require_price("output_cost_per_mtok", self.output_cost_per_mtok)?;
        if let Some(cached) = self.cached_input_cost_per_mtok {
            self.require_price("cached_input_cost_per_mtok", cached)?;
        }
        if let Some(tps) = self.tokens_per_second {
            self.require_price("tokens_per_second", tps)?;
        }
        self.require_price("input_discount_price", self.input_discount_price)?;
        self.require_price("output_discount_price", self.output_discount_price)?;

        if self.modalities.is_empty() {
            return Err(self.invalid("modalities must not be empty".to_string()));
        }

        let discount = DiscountWindow::parse(
            &self.discount_start_time_utc,
            &self.discount_end_time_utc,
            self.input_discount_price,
            self.output_discount_price,
        )
        .map_err(|e| self.invalid(format!("discount window is not HH:MM: {e}")))?;

        let fields = OfferingFields {
            api_model_name: self.api_model_name.trim().to_string(),
            context_window: self.context_window,
            max_output_tokens: self.max_output_tokens,
            input_cost_per_mtok: self.input_cost_per_mtok,
            output_cost_per_mtok: self.output_cost_per_mtok,
            cached_input_cost_per_mtok: self.cached_input_cost_per_mtok,
            tokens_per_second: self.tokens_per_second,
            supports_tools: self.supports_tools,
            discount,
            is_active: self.is_active,
        };

        Ok((fields, self.modalities.iter().copied().collect()))
    }

    fn require_price(&self, field: &str, value: f64) -> Result<(), CatalogError> {
        if !value.is_finite() || value < 0.0 {
            return Err(self.invalid(format!("{field} must be a non-negative number, got {value}")));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> CatalogError {
        CatalogError::InvalidSpec {
            reason: format!("{}: {}", self.api_model_name, reason),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidSpec {
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(())
}
