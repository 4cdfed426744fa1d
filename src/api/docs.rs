//! OpenAPI document.

use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::handlers::{self, HealthResponse, MessageResponse};
use crate::patient::{
    Gender, NewPatient, PatientDetails, PatientRecord, PatientUpdate, PatientView, Verdict,
};

/// OpenAPI description of every public route.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Patient Records API",
        description = "Create, read, sort, update and delete patient records with derived BMI"
    ),
    paths(
        handlers::hello,
        handlers::about,
        handlers::timepass,
        handlers::health,
        handlers::view,
        handlers::get_patient,
        handlers::sort_patients,
        handlers::create_patient,
        handlers::update_patient,
        handlers::delete_patient,
    ),
    components(schemas(
        Gender,
        Verdict,
        PatientDetails,
        PatientView,
        PatientRecord,
        NewPatient,
        PatientUpdate,
        MessageResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "patients", description = "Patient record management"),
        (name = "info", description = "Service information"),
    )
)]
pub struct ApiDoc;
