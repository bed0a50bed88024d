//! # KLAS Common Library
//!
//! Shared code for KLAS content services including:
//! - Database initialization and schema
//! - Entity models and provenance records
//! - Configuration resolution
//! - Grade-band ordering helpers

pub mod config;
pub mod db;
pub mod error;
pub mod grades;

pub use error::{Error, Result};
