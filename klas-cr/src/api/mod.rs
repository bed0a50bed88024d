//! HTTP API handlers for the content readiness service

pub mod coverage;
pub mod health;

pub use coverage::{filter_modules, get_cell, get_coverage, get_ready, get_summary};
pub use health::health_routes;
