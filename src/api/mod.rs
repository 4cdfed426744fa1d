//! HTTP API module for patient records, health, metrics and docs.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;

pub use docs::ApiDoc;
pub use error::ErrorResponse;
pub use handlers::AppState;
pub use routes::create_router;
