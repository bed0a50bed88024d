//! Shared database access for KLAS services

pub mod init;
pub mod models;

pub use init::{init_database, init_schema};
