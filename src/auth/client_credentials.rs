//! Client-credentials token provider.
//!
//! Exchanges an application's client id and secret for an app-only access
//! token at the tenant's v2.0 token endpoint. The token is reused until
//! shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{TokenProvider, GRAPH_DEFAULT_SCOPE};
use crate::error::{Result, SharepointError};

/// Default Microsoft identity platform host
pub const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";

/// Buffer time before token expiry to trigger refresh (60 seconds).
const EXPIRY_BUFFER_SECS: u64 = 60;

/// Lifetime assumed when the endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    fetched_at: Instant,
    expires_in_secs: u64,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        let elapsed = self.fetched_at.elapsed().as_secs();
        let effective_expiry = self.expires_in_secs.saturating_sub(EXPIRY_BUFFER_SECS);
        elapsed < effective_expiry
    }
}

/// Configuration for the client-credentials provider.
#[derive(Debug, Clone)]
pub struct ClientCredentialsConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Identity platform host, without trailing slash
    pub login_url: String,
    pub timeout: Option<Duration>,
}

impl ClientCredentialsConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            timeout: None,
        }
    }

    /// Token endpoint for the configured tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_url.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

/// Token provider for the OAuth2 client-credentials grant.
pub struct ClientCredentialsProvider {
    config: ClientCredentialsConfig,
    client: reqwest::Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(config: ClientCredentialsConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            client,
            cached_token: RwLock::new(None),
        })
    }

    async fn fetch_token(&self, scopes: &[&str]) -> Result<(String, u64)> {
        let scope = if scopes.is_empty() {
            GRAPH_DEFAULT_SCOPE.to_string()
        } else {
            scopes.join(" ")
        };

        let url = self.config.token_url();
        debug!("requesting access token from {}", url);

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SharepointError::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SharepointError::Auth(format!(
                "token endpoint returned error {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SharepointError::Auth(format!("malformed token response: {}", e)))?;

        let expires_in = token_response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        Ok((token_response.access_token, expires_in))
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<String> {
        {
            let cache = self.cached_token.read();
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    trace!("reusing cached access token");
                    return Ok(cached.token.clone());
                }
            }
        }

        let (token, expires_in) = self.fetch_token(scopes).await?;

        *self.cached_token.write() = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
            expires_in_secs: expires_in,
        });

        Ok(token)
    }
}
