//! Token provider abstractions for Microsoft Graph authentication
//!
//! Two token sources are supported:
//! - Client credentials against the Microsoft identity platform (app-only access)
//! - Static tokens (testing, or tokens obtained elsewhere)

pub mod client_credentials;
pub mod static_token;

use async_trait::async_trait;

use crate::error::Result;

pub use client_credentials::{ClientCredentialsConfig, ClientCredentialsProvider};
pub use static_token::StaticTokenProvider;

/// Scope granting the application's configured Graph permissions
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Source of bearer tokens for the Graph API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get an access token valid for the given scopes.
    async fn get_token(&self, scopes: &[&str]) -> Result<String>;
}
