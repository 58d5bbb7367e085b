//! Pricing and comparison routes.

use axum::extract::{Extension, Query};
use axum::Json;
use serde::Deserialize;

use catalog::{
    compare_models, ComparisonReport, ComparisonRequest, Modality, OfferingFilter, OfferingPricing,
};

use super::{ApiResponse, ErrorResponse};
use crate::server::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PricingQuery {
    pub modality: Option<String>,
}

/// `GET /pricing` - per-token prices of every active offering.
///
/// `modality` keeps only offerings that support it.
pub async fn list_pricing(
    Extension(state): Extension<AppState>,
    Query(query): Query<PricingQuery>,
) -> Result<ApiResponse<Vec<OfferingPricing>>, ErrorResponse> {
    let mut filter = OfferingFilter::new();
    if let Some(modality) = query.modality.as_deref() {
        let modality: Modality = modality
            .parse()
            .map_err(|_| ErrorResponse::bad_request(format!("invalid modality: {}", modality)))?;
        filter = filter.with_required_modalities([modality]);
    }

    let offerings = state.store.find_offerings(&filter).await?;
    let pricing = offerings.iter().map(OfferingPricing::from).collect();
    Ok(ApiResponse::success(pricing))
}

/// `POST /pricing/compare`
pub async fn compare_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ComparisonRequest>,
) -> Result<ApiResponse<ComparisonReport>, ErrorResponse> {
    tracing::debug!(models = ?request.models, mode = %request.mode, "Comparing models");

    let report = compare_models(state.store.as_ref(), &request).await?;
    let message = format!("Compared {} offerings", report.models.len());
    Ok(ApiResponse::success(report).with_message(message))
}
