use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use catalog::CatalogCounts;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: DatabaseHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<CatalogCounts>,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct RootResponse {
    message: &'static str,
}

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse { message: "Ready" })
}

/// Health check endpoint
///
/// Counts catalog rows as a store round trip. Returns 200 OK when the store
/// answers within five seconds, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let (database, catalog) = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.store.counts(),
    )
    .await
    {
        Ok(Ok(counts)) => (
            DatabaseHealth {
                status: "ok".to_string(),
                error: None,
            },
            Some(counts),
        ),
        Ok(Err(e)) => (
            DatabaseHealth {
                status: "error".to_string(),
                error: Some(format!("Query failed: {}", e)),
            },
            None,
        ),
        Err(_) => (
            DatabaseHealth {
                status: "error".to_string(),
                error: Some("Query timeout (>5s)".to_string()),
            },
            None,
        ),
    };

    let is_healthy = database.status == "ok";

    let overall_status = if is_healthy { "healthy" } else { "unhealthy" };

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: overall_status.to_string(),
            database,
            catalog,
        }),
    )
}
