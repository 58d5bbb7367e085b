//! Filters for offering lookups.

use serde::{Deserialize, Serialize};

use super::modality::Modality;
use super::offering::Offering;

/// Criteria for finding offerings.
///
/// Results are always ordered by the average of input and output cost
/// per million tokens, cheapest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingFilter {
    pub min_context_window: Option<i32>,
    /// Every listed modality must be supported.
    #[serde(default)]
    pub required_modalities: Vec<Modality>,
    pub supports_tools: Option<bool>,
    pub is_active: bool,
}

impl Default for OfferingFilter {
    fn default() -> Self {
        Self {
            min_context_window: None,
            required_modalities: Vec::new(),
            supports_tools: None,
            is_active: true,
        }
    }
}

impl OfferingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_context_window(mut self, tokens: i32) -> Self {
        self.min_context_window = Some(tokens);
        self
    }

    pub fn with_required_modalities(mut self, modalities: impl IntoIterator<Item = Modality>) -> Self {
        self.required_modalities = modalities.into_iter().collect();
        self
    }

    pub fn with_tools(mut self, supports_tools: bool) -> Self {
        self.supports_tools = Some(supports_tools);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// In-process evaluation, used by the memory store.
    pub fn matches(&self, offering: &Offering) -> bool {
        if offering.is_active != self.is_active {
            return false;
        }
        if let Some(min) = self.min_context_window {
            if offering.context_window < min {
                return false;
            }
        }
        if let Some(tools) = self.supports_tools {
            if offering.supports_tools != tools {
                return false;
            }
        }
        offering.modalities.contains_all(&self.required_modalities)
    }
}
