//! File-backed patient record service.
//!
//! Stores patient records (id, demographics, height and weight) in a single
//! JSON document and serves them over HTTP together with two derived
//! metrics:
//!
//! ```text
//! bmi     = round(weight / height², 2)
//! verdict = Underweight | normal | Overweight | Obese
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`patient`]: Record model, validation and derived metrics
//! - [`store`]: Collection access patterns and file persistence
//! - [`api`]: HTTP API for patient records, health and metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod patient;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
