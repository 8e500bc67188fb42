//! Society Portal Common Library
//!
//! Shared code for the portal services including:
//! - Document store and object store contracts
//! - Typed per-collection record schemas
//! - The generic collection panel workflow
//! - Category grouping and carousel view state
//! - Error types and handling
//! - Configuration management
//! - Authentication and session utilities
//! - Metrics and observability

pub mod auth;
pub mod carousel;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod panel;
pub mod placeholder;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use panel::{Panel, PanelState};
pub use store::{DocumentStore, ObjectStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
