//! service-core: Shared infrastructure for the document portal services.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
