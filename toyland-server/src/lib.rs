//! toyland-server: HTTP API over the ToyLand toy collection
//!
//! Every route translates one request into one document-store call and
//! returns the store's result as JSON.

pub mod config;
pub mod http;
pub mod models;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use http::{build_router, run_server, ServerConfig, ServerError, ToyLandApp};
pub use state::AppState;
pub use store::{StoreError, ToyStore};
