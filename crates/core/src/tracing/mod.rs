//! Tracing setup shared by Kipesa binaries

pub mod config;
pub mod init;

pub use config::{InstrumentationConfig, LogFormat};
pub use init::{init_default, init_tracing};
