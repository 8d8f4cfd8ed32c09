pub mod auth;
pub mod config;
pub mod error;
pub mod oauth;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod store;

pub use auth::{AuthContext, AuthError, AuthExtractor, BearerTokenAuth};
pub use config::{ApiVariant, DemoCredentials, ServerConfig};
pub use error::{ApiError, Result};
pub use server::{PetStoreServer, PetStoreServerBuilder};
pub use store::PetStore;

// Re-export only what's needed for trait implementations
pub use axum::async_trait;
