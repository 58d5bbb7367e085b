//! Offering lookup routes.

use axum::extract::{Extension, Path, Query};
use serde::{Deserialize, Serialize};

use catalog::{
    CatalogError, DiscountWindow, Modality, OfferingFilter, OfferingId, OfferingPricing, OfferingView,
};

use super::{ApiResponse, ErrorResponse};
use crate::server::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ModelsQuery {
    pub min_context_window: Option<i32>,
    /// Comma-separated, e.g. `text,image`
    pub required_modalities: Option<String>,
    pub supports_tools: Option<bool>,
    pub is_active: Option<bool>,
}

impl ModelsQuery {
    fn into_filter(self) -> Result<OfferingFilter, CatalogError> {
        let mut filter = OfferingFilter::new().with_active(self.is_active.unwrap_or(true));

        if let Some(tokens) = self.min_context_window {
            filter = filter.with_min_context_window(tokens);
        }
        if let Some(supports_tools) = self.supports_tools {
            filter = filter.with_tools(supports_tools);
        }
        if let Some(list) = self.required_modalities.as_deref() {
            let modalities = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<Modality>)
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.with_required_modalities(modalities);
        }
        Ok(filter)
    }
}

/// Per-token pricing of a single offering.
#[derive(Debug, Serialize)]
pub struct ModelPricing {
    #[serde(flatten)]
    pub pricing: OfferingPricing,
    pub unit: &'static str,
    pub free_tier: bool,
    /// Present only when the offering advertises a discount window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountWindow>,
}

impl From<&OfferingView> for ModelPricing {
    fn from(view: &OfferingView) -> Self {
        Self {
            pricing: OfferingPricing::from(view),
            unit: "per token",
            free_tier: false,
            discount: Some(view.offering.discount).filter(DiscountWindow::is_active_discount),
        }
    }
}

/// `GET /models` - offerings matching the query, cheapest first.
pub async fn list_models(
    Extension(state): Extension<AppState>,
    Query(query): Query<ModelsQuery>,
) -> Result<ApiResponse<Vec<OfferingView>>, ErrorResponse> {
    let filter = query.into_filter()?;
    let offerings = state.store.find_offerings(&filter).await?;
    Ok(ApiResponse::success(offerings))
}

/// `GET /models/names`
pub async fn model_names(
    Extension(state): Extension<AppState>,
) -> Result<ApiResponse<Vec<String>>, ErrorResponse> {
    let names = state.store.list_active_api_names().await?;
    Ok(ApiResponse::success(names))
}

/// `GET /modalities`
pub async fn list_modalities() -> ApiResponse<Vec<Modality>> {
    ApiResponse::success(Modality::ALL.to_vec())
}

/// `GET /models/:id/pricing`
pub async fn model_pricing(
    Extension(state): Extension<AppState>,
    Path(id): Path<OfferingId>,
) -> Result<ApiResponse<ModelPricing>, ErrorResponse> {
    let view = state
        .store
        .get_offering(id)
        .await?
        .ok_or_else(|| ErrorResponse::not_found(format!("offering {} not found", id)))?;

    Ok(ApiResponse::success(ModelPricing::from(&view)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_to_active() {
        let filter = ModelsQuery::default().into_filter().unwrap();
        assert_eq!(filter, OfferingFilter::new());
    }

    #[test]
    fn test_query_parses_modalities() {
        let query = ModelsQuery {
            required_modalities: Some("text, image".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(
            filter,
            OfferingFilter::new().with_required_modalities([Modality::Text, Modality::Image])
        );

        let bad = ModelsQuery {
            required_modalities: Some("smell".to_string()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }
}
