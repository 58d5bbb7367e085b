use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use catalog::CatalogError;

/// Error body returned by every route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<CatalogError> for ErrorResponse {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } | CatalogError::ModelsNotFound { .. } => {
                Self::not_found(err.to_string())
            }
            CatalogError::InvalidSpec { .. } | CatalogError::InvalidUsage(_) => {
                Self::bad_request(err.to_string())
            }
            CatalogError::Conflict(_) => Self::conflict(err.to_string()),
            CatalogError::Storage(_) => {
                tracing::error!(error = %err, "Storage failure while serving request");
                Self::internal("internal storage error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CatalogError::NotFound { entity: "offering", key: "7".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                CatalogError::ModelsNotFound { requested: vec!["x".into()] },
                StatusCode::NOT_FOUND,
            ),
            (CatalogError::InvalidUsage("zero".into()), StatusCode::BAD_REQUEST),
            (CatalogError::Conflict("dup".into()), StatusCode::CONFLICT),
            (CatalogError::storage("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ErrorResponse::from(err).status, status);
        }
    }
}
