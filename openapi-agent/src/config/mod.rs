//! Declarative agent configuration.
//!
//! An [`AgentDefinition`] is read from YAML. Secrets never appear in the file:
//! it names environment variables ([`EnvKey`]) that are resolved at load time.

pub mod env_resolver;
pub mod loader;
pub mod types;

pub use env_resolver::{default_env_resolver, EnvKey, EnvResolverFn};
pub use loader::AgentLoader;
pub use types::{AgentDefinition, AuthSettings, ModelConfig, SpecSource};
