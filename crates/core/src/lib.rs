//! Kipesa core types and utilities

pub mod config;
pub mod error;
pub mod store;
pub mod validation;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(any(test, feature = "mocks"))]
pub mod tests;

pub use config::ClientConfig;
pub use error::{CoreError, CoreResult};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use validation::{ValidateConfig, validators};
