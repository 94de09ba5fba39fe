//! Static token provider for testing and pre-obtained tokens.

use async_trait::async_trait;

use super::TokenProvider;
use crate::error::{Result, SharepointError};

/// A token provider that hands out a fixed token.
///
/// The token is never refreshed.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _scopes: &[&str]) -> Result<String> {
        if self.token.is_empty() {
            return Err(SharepointError::Auth("static token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}
