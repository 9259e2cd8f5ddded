//! Axum server setup
//!
//! Startup runs in a fixed order with no retries:
//! 1. ensure the `name` index
//! 2. ping the store
//! 3. bind the listener and serve
//!
//! The store handle is created by the caller before this runs.
//!
//! Route names match case-insensitively and ignore a trailing slash, so
//! `/TotalToys/` reaches `/totalToys`. Path parameters keep their case.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Uri;
use axum::Router;
use tokio::net::TcpListener;
use tower::util::MapRequest;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::state::AppState;
use crate::store::{StoreError, ToyStore};

/// Default listening port
pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

/// The router behind its path normalization.
pub type ToyLandApp = NormalizePath<MapRequest<Router, fn(Request) -> Request>>;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> ToyLandApp {
    let router = Router::new()
        .merge(routes::root::router::<AppState>())
        .merge(routes::toys::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Rewrites must happen before routing, so they wrap the router itself
    ServiceBuilder::new()
        .layer(NormalizePathLayer::trim_trailing_slash())
        .map_request(canonical_route_case as fn(Request) -> Request)
        .service(router)
}

fn canonical_route_case(mut req: Request) -> Request {
    if let Some(uri) = canonical_uri(req.uri()) {
        *req.uri_mut() = uri;
    }
    req
}

/// Same URI with the leading route segment in its registered case, or
/// `None` when it is already canonical or names no route.
fn canonical_uri(uri: &Uri) -> Option<Uri> {
    let rest = uri.path().strip_prefix('/')?;
    let (head, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let canonical = routes::toys::ROUTE_SEGMENTS
        .iter()
        .find(|segment| segment.eq_ignore_ascii_case(head) && **segment != head)?;

    let path_and_query = match uri.query() {
        Some(query) => format!("/{canonical}{tail}?{query}"),
        None => format!("/{canonical}{tail}"),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

/// Prepare the store and run the HTTP server until shutdown.
///
/// The store is never closed, including after the listener stops.
pub async fn run_server(store: Arc<dyn ToyStore>, config: ServerConfig) -> Result<(), ServerError> {
    let index = store.ensure_name_index().await?;
    tracing::info!(index = %index, "name index ready");

    store.ping().await?;
    tracing::info!("Pinged your deployment. You successfully connected to the store!");

    let app = build_router(AppState::new(store));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "ToyLand server is running on port: {}",
        config.bind_addr.port()
    );

    axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
