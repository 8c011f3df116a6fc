//! Server infrastructure: router assembly, liveness, serving and graceful
//! shutdown.
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//!
//! let router = create_router::<ApiDoc>(api_routes)?;
//! create_app(router, &ServerConfig::default()).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router};
pub use health::health_router;
pub use shutdown::shutdown_signal;
