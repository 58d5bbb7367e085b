use axum::extract::{Extension, Query};
use serde::Deserialize;

use catalog::{Provider, DEFAULT_LIST_LIMIT};

use super::{ApiResponse, ErrorResponse};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

/// `GET /providers`
pub async fn list_providers(
    Extension(state): Extension<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Provider>>, ErrorResponse> {
    let providers = state.store.list_providers(page.skip, page.limit).await?;
    Ok(ApiResponse::success(providers))
}
