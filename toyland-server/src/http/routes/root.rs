//! Root endpoint

use axum::{routing::get, Router};

pub const WELCOME: &str = "Welcome to ToyLand Server";

/// GET /
async fn welcome() -> &'static str {
    WELCOME
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(welcome))
}
