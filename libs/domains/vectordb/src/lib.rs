//! Vector Database Domain
//!
//! Multi-tenant storage of embedding vectors with exact nearest-neighbour
//! search. Every request is authenticated into a [`TenantContext`] and only
//! ever sees that tenant's collections.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │     Handlers     │  ← POST /v2/vectordb/...
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │ VectorDbService  │  ← AuthGate, root-only user administration
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────────────────────────────┐
//! │ CollectionRegistry │ EntityStore │ Search │  ← tenant scoping, validation, ranking
//! └────────┬─────────────────────────────────┘
//!          │
//! ┌────────▼─────────┐
//! │ VectorStore /    │  ← in-memory or PostgreSQL
//! │ CredentialStore  │
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_vectordb::{
//!     InMemoryCredentialStore, InMemoryVectorStore, VectorDbConfig, VectorDbService, handlers,
//! };
//!
//! let config = VectorDbConfig::new("root", "change-me");
//! let service = VectorDbService::new(
//!     InMemoryCredentialStore::new(),
//!     InMemoryVectorStore::new(),
//!     &config,
//! )
//! .unwrap();
//!
//! let router = handlers::router(service);
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod models;
pub mod postgres;
pub mod registry;
pub mod repository;
pub mod search;
pub mod service;
mod timeout;

// Re-export commonly used types
pub use auth::{AuthGate, SecretHasher};
pub use config::VectorDbConfig;
pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use error::{VectorDbError, VectorDbResult};
pub use handlers::VectorDbApiDoc;
pub use models::{
    Collection, CollectionDescription, DistanceMetric, Entity, EntityId, EntityRecord,
    InsertResult, Metadata, NewCollection, NewEntity, NewTenant, SearchHit, SearchQuery,
    TenantContext,
};
pub use postgres::{PgCredentialStore, PgVectorStore};
pub use repository::{InMemoryVectorStore, VectorStore};
pub use service::VectorDbService;
