//! Stateful services built on the access layer

pub mod auth;
pub mod chat;
pub mod finance;

pub use auth::{AuthService, AuthState};
pub use chat::ChatSession;
pub use finance::{FinanceService, FinanceState};

use crate::client::ClientError;

/// Server-provided detail when available, otherwise a generic message
pub(crate) fn user_message(err: &ClientError, fallback: &str) -> String {
    err.detail_message()
        .map_or_else(|| fallback.to_string(), str::to_string)
}
