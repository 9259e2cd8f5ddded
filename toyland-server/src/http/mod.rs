//! HTTP server layer
//!
//! Axum server with:
//! - Permissive CORS
//! - Request tracing
//! - Graceful shutdown of the listener (the store client stays open)
//! - Unstructured 500s for every failure

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, run_server, ServerConfig, ServerError, ToyLandApp};
