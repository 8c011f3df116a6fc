use super::shutdown::shutdown_signal;
use crate::errors::handlers::not_found;
use axum::{Json, Router, http::HeaderValue, routing::get};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Binds the configured address and serves `router` until a shutdown signal.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails while
/// running.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use core_config::server::ServerConfig;
/// use axum_helpers::server::create_app;
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     create_app(Router::new(), &ServerConfig::default()).await
/// }
/// ```
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    info!("Server stopped");
    Ok(())
}

/// Wraps API routes with the cross-cutting pieces every server shares:
///
/// - `GET /api-docs/openapi.json` serving `T`'s document
/// - JSON 404 fallback
/// - request tracing
/// - CORS when `CORS_ALLOWED_ORIGIN` is set (comma-separated origins)
///
/// Domain routers apply their own state before being passed in.
///
/// # Errors
/// Returns `InvalidInput` when `CORS_ALLOWED_ORIGIN` holds an invalid origin.
pub fn create_router<T>(apis: Router) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let openapi = T::openapi();

    let router = Router::new()
        .route("/api-docs/openapi.json", get(move || async move { Json(openapi) }))
        .merge(apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    match cors_layer()? {
        Some(cors) => Ok(router.layer(cors)),
        None => Ok(router),
    }
}

fn cors_layer() -> io::Result<Option<CorsLayer>> {
    use axum::http::{Method, header};

    let Ok(origins_str) = std::env::var("CORS_ALLOWED_ORIGIN") else {
        return Ok(None);
    };

    let allowed_origins: Vec<HeaderValue> = origins_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    if allowed_origins.is_empty() {
        return Ok(None);
    }

    info!("CORS configured with allowed origins: {}", origins_str);

    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed_origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600)),
    ))
}
