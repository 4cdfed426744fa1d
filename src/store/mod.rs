//! Record store module.
//!
//! This module handles:
//! - The in-memory collection and its access patterns (lookup, sort, insert, remove)
//! - Whole-file JSON persistence with atomic replace
//! - The serialized read-modify-write service shared by HTTP handlers

pub mod collection;
pub mod file;
pub mod service;

pub use collection::{PatientCollection, SortKey, SortOrder};
pub use file::FileStore;
pub use service::PatientStore;
