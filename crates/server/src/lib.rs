//! Framework Hub REST backend
//!
//! CRUD for build logs and generated code, aggregate stats and a simulated
//! Jenkins trigger, all under `/api`.

pub mod jenkins;
pub mod routes;
pub mod storage;

pub use routes::router;
pub use storage::{open_store, DocumentStore, MemoryDocuments};

use axum::http::HeaderValue;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// CORS for the given origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router with CORS and request tracing
pub fn app(store: Arc<dyn DocumentStore>, cors_origins: &[String]) -> Router {
    router(store)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Serve until the process is stopped
pub async fn serve(
    addr: SocketAddr,
    store: Arc<dyn DocumentStore>,
    cors_origins: &[String],
) -> anyhow::Result<()> {
    info!(
        "Framework Hub API listening on http://{}/api (storage: {})",
        addr,
        store.label()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(store, cors_origins)).await?;

    Ok(())
}
