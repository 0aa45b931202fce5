//! Odoo API Connector Library
//!
//! This library exports the core modules used by the server binary and
//! by the integration test suite.

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types for convenience
pub use clients::OdooClient;
pub use config::AppSettings;
pub use error::AppError;
