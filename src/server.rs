//! HTTP server wiring: the redirect layer in front of the application.
use std::{net::SocketAddr, sync::Arc};

use axum::{Router, extract::Request, http::StatusCode, middleware};
use eyre::{Context, Result};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    adapters::create_redirect_middleware, config::ServerConfig, core::RedirectEngine,
    tracing_setup::create_request_span, utils::shutdown_signal,
};

/// Build the application router.
///
/// Requests the engine does not redirect are served from `static_root`, or
/// answered with `404 Not Found` when no root is configured.
pub fn build_router(engine: Arc<RedirectEngine>, static_root: Option<&str>) -> Router {
    let router = match static_root {
        Some(root) => Router::new()
            .fallback_service(ServeDir::new(root).append_index_html_on_directories(true)),
        None => Router::new().fallback(|| async { StatusCode::NOT_FOUND }),
    };

    router
        .layer(middleware::from_fn(create_redirect_middleware(engine)))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            create_request_span(req.method().as_str(), &req.uri().to_string())
        }))
}

/// Bind `config.listen_addr` and serve until a shutdown signal arrives.
pub async fn serve(config: &ServerConfig, engine: Arc<RedirectEngine>) -> Result<()> {
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    let app = build_router(engine, config.static_root.as_deref());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("canonize server starting on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
        })
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}
