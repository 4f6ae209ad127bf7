//! Kipesa HTTP client
//!
//! Provides the de-duplicating, timeout-bounded access layer for the Kipesa
//! API together with the session, typed endpoints and the stateful services
//! (authentication and chat) built on top of it.

pub mod client;
pub mod services;
pub mod session;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, ClientError, RequestOptions, RequestTimeouts};
pub use services::{AuthService, ChatSession, FinanceService};
pub use session::{AccessToken, Session};
