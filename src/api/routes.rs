//! HTTP API route definitions.

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{
    about, create_patient, delete_patient, get_patient, health, hello, metrics_text, openapi,
    sort_patients, timepass, track_latency, update_patient, view, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Static endpoints
        .route("/", get(hello))
        .route("/about", get(about))
        .route("/timepass", get(timepass))
        // Patient records
        .route("/view", get(view))
        .route("/patient/:patient_id", get(get_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:patient_id", put(update_patient))
        .route("/delete/:patient_id", delete(delete_patient))
        // Operations
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/openapi.json", get(openapi))
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
