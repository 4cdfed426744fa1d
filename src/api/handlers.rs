//! HTTP API handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use indexmap::IndexMap;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

use super::docs::ApiDoc;
use super::error::ErrorResponse;
use crate::error::{ServiceError, StoreError};
use crate::metrics;
use crate::patient::{
    validate_value, NewPatient, PatientRecord, PatientUpdate, PatientView, VerdictRule,
};
use crate::store::{PatientStore, SortKey};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record store.
    pub store: Arc<PatientStore>,
    /// Overweight band used when deriving verdicts.
    pub verdict_rule: VerdictRule,
    /// Prometheus render handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(store: PatientStore, verdict_rule: VerdictRule) -> Self {
        Self {
            store: Arc::new(store),
            verdict_rule,
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Plain message response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: String,
}

/// Query parameters of `/sort`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortParams {
    /// One of height, weight, bmi.
    pub sort_by: Option<String>,
    /// asc or desc; defaults to asc.
    pub order: Option<String>,
}

/// Liveness message.
#[utoipa::path(get, path = "/", tag = "info",
    responses((status = 200, description = "Service is up", body = MessageResponse)))]
pub async fn hello() -> Json<MessageResponse> {
    MessageResponse::new("Patient Management System API")
}

/// What this service is.
#[utoipa::path(get, path = "/about", tag = "info",
    responses((status = 200, description = "Service description", body = MessageResponse)))]
pub async fn about() -> Json<MessageResponse> {
    MessageResponse::new("A fully functional API to manage your patient records")
}

/// Static filler endpoint kept for client compatibility.
#[utoipa::path(get, path = "/timepass", tag = "info",
    responses((status = 200, description = "Static text", body = MessageResponse)))]
pub async fn timepass() -> Json<MessageResponse> {
    MessageResponse::new("Watching Reels in Instagram")
}

/// Health check handler - always returns 200.
#[utoipa::path(get, path = "/health", tag = "info",
    responses((status = 200, description = "Process is alive", body = HealthResponse)))]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Full collection keyed by id, with derived metrics, in stored order.
#[utoipa::path(get, path = "/view", tag = "patients",
    responses(
        (status = 200, description = "All patients keyed by id", body = HashMap<String, PatientView>),
        (status = 503, description = "Patient file unavailable", body = ErrorResponse),
    ))]
pub async fn view(
    State(state): State<AppState>,
) -> Result<Json<IndexMap<String, PatientView>>, ServiceError> {
    let collection = state.store.view_all().await?;
    Ok(Json(collection.views(state.verdict_rule)))
}

/// One patient by id.
#[utoipa::path(get, path = "/patient/{patient_id}", tag = "patients",
    params(("patient_id" = String, Path, description = "Patient id", example = "P001")),
    responses(
        (status = 200, description = "Patient found", body = PatientRecord),
        (status = 404, description = "No patient with this id", body = ErrorResponse),
    ))]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientRecord>, ServiceError> {
    let patient = state.store.get(&patient_id).await?;
    Ok(Json(patient.record(state.verdict_rule)))
}

/// Patients sorted by height, weight or bmi.
#[utoipa::path(get, path = "/sort", tag = "patients",
    params(SortParams),
    responses(
        (status = 200, description = "Sorted patients", body = Vec<PatientRecord>),
        (status = 400, description = "Invalid sort_by or order", body = ErrorResponse),
    ))]
pub async fn sort_patients(
    State(state): State<AppState>,
    params: Result<Query<SortParams>, QueryRejection>,
) -> Result<Json<Vec<PatientRecord>>, ServiceError> {
    let Query(params) = params?;
    let sort_by = params.sort_by.ok_or(StoreError::InvalidArgument {
        param: "sort_by",
        value: String::new(),
        allowed: SortKey::ALLOWED,
    })?;

    let patients = state.store.sorted(&sort_by, params.order.as_deref()).await?;
    let records = patients
        .iter()
        .map(|p| p.record(state.verdict_rule))
        .collect();

    Ok(Json(records))
}

/// Create a patient.
#[utoipa::path(post, path = "/create", tag = "patients",
    request_body = NewPatient,
    responses(
        (status = 200, description = "Patient created", body = MessageResponse),
        (status = 400, description = "Id already exists", body = ErrorResponse),
        (status = 422, description = "Field validation failed", body = ErrorResponse),
    ))]
pub async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let Json(body) = body?;
    let patient = validate_value(&body)?;
    let id = patient.id.clone();

    state.store.create(patient).await?;

    info!(id = %id, "Created patient");
    Ok(MessageResponse::new("successfully saved the data in the database"))
}

/// Update some fields of a patient.
#[utoipa::path(put, path = "/edit/{patient_id}", tag = "patients",
    params(("patient_id" = String, Path, description = "Patient id", example = "P001")),
    request_body = PatientUpdate,
    responses(
        (status = 200, description = "Patient updated", body = MessageResponse),
        (status = 404, description = "No patient with this id", body = ErrorResponse),
        (status = 422, description = "Merged record failed validation", body = ErrorResponse),
    ))]
pub async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    changes: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let Json(changes) = changes?;
    state.store.update(&patient_id, &changes).await?;

    info!(id = %patient_id, "Updated patient");
    Ok(MessageResponse::new("Successfully updated the patient"))
}

/// Delete a patient.
#[utoipa::path(delete, path = "/delete/{patient_id}", tag = "patients",
    params(("patient_id" = String, Path, description = "Patient id", example = "P001")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageResponse),
        (status = 404, description = "No patient with this id", body = ErrorResponse),
    ))]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.store.delete(&patient_id).await?;

    info!(id = %patient_id, "Deleted patient");
    Ok(MessageResponse::new("Successfully deleted the patient"))
}

/// Prometheus exposition text.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}

/// OpenAPI document for every route.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Middleware recording request latency per matched route.
pub async fn track_latency(matched: Option<MatchedPath>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = matched
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_http_latency(start, &endpoint);
    response
}
