//! # Axum Helpers
//!
//! Shared HTTP plumbing for the vector database server.
//!
//! ## Modules
//!
//! - **[`server`]**: router assembly, serving, graceful shutdown
//! - **[`errors`]**: structured error responses with numeric error codes
//! - **[`response`]**: the `{"code": 0, "data": ...}` success envelope
//! - **[`extractors`]**: bearer token and validated JSON extractors
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes)?;
//!     create_app(router, &ServerConfig::default()).await
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod response;
pub mod server;

// Re-export server types
pub use server::{create_app, create_router, health_router, shutdown_signal};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::{BearerToken, ValidatedJson};

pub use response::ApiResponse;
