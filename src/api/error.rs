//! Mapping of service errors onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::error::{ServiceError, StoreError, ValidationError};
use crate::metrics;

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub detail: String,
    /// HTTP status code.
    pub code: u16,
    /// Offending field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ServiceError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Store(store) => match store {
                StoreError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
                StoreError::DuplicateId { .. } => StatusCode::BAD_REQUEST,
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServiceError::Config(_) | ServiceError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::Store(store) => store.kind(),
            _ => "internal",
        }
    }
}

/// A body axum could not decode is a validation failure of the whole body.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::new("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        StoreError::InvalidArgument {
            param: "query",
            value: rejection.body_text(),
            allowed: "sort_by, order",
        }
        .into()
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let field = match err {
            ServiceError::Validation(v) => Some(v.field.clone()),
            _ => None,
        };

        Self {
            detail: err.to_string(),
            code: err.status_code().as_u16(),
            field,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        metrics::inc_requests_rejected(self.kind());

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
