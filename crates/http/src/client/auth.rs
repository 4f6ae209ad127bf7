//! Authentication API client methods

use super::{ApiClient, ClientError};
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};

impl ApiClient {
    /// Exchange credentials for an access token
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.post("/auth/login", request).await
    }

    /// Create an account
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ClientError> {
        self.post("/auth/register", request).await
    }

    /// Get the profile of the authenticated user
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.get("/auth/profile").await
    }
}
