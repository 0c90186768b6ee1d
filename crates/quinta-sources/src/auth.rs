//! Impersonated Google credentials
//!
//! A source token belonging to the caller (from an environment variable, or
//! the GCE metadata server when running on Google infrastructure) is
//! exchanged for a short-lived token of the target service account through
//! the IAM Credentials `generateAccessToken` endpoint. The resulting
//! [`GoogleSession`] is shared by every authenticated API call in a run.

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default IAM Credentials API endpoint
pub const IAM_CREDENTIALS_ENDPOINT: &str = "https://iamcredentials.googleapis.com/v1";

/// Default GCE metadata token endpoint
pub const METADATA_TOKEN_ENDPOINT: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Environment variable consulted for the source token
pub const DEFAULT_SOURCE_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Scopes needed for read-only search data and analytics reporting
pub const DEFAULT_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/webmasters.readonly",
    "https://www.googleapis.com/auth/analytics",
    "https://www.googleapis.com/auth/analytics.edit",
];

/// Service account impersonated by default
pub const DEFAULT_TARGET_PRINCIPAL: &str = "quinta@seo-reporter.iam.gserviceaccount.com";

/// Impersonation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Service account to impersonate
    #[serde(default = "default_target_principal")]
    pub target_principal: String,

    /// OAuth scopes requested for the impersonated token
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,

    /// Environment variable holding the caller's own access token
    #[serde(default = "default_source_token_env")]
    pub source_token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            target_principal: default_target_principal(),
            scopes: default_scopes(),
            lifetime_secs: default_lifetime_secs(),
            source_token_env: default_source_token_env(),
        }
    }
}

fn default_target_principal() -> String {
    DEFAULT_TARGET_PRINCIPAL.to_string()
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_lifetime_secs() -> u64 {
    3600
}

fn default_source_token_env() -> String {
    DEFAULT_SOURCE_TOKEN_ENV.to_string()
}

/// An OAuth bearer token
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<String>,
}

impl AccessToken {
    /// Wrap a bearer token
    pub fn new(secret: impl Into<String>, expires_at: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// The bearer secret
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// RFC 3339 expiry, when the issuer reported one
    pub fn expires_at(&self) -> Option<&str> {
        self.expires_at.as_deref()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authenticated handle shared by Search Console and Analytics calls
#[derive(Debug, Clone)]
pub struct GoogleSession {
    token: AccessToken,
}

impl GoogleSession {
    /// Create a session from an already-issued token
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// The impersonated token
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Attach the bearer token to a request
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.secret())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenRequest<'a> {
    scope: &'a [String],
    lifetime: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: Option<String>,
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Issues impersonated tokens for the configured service account
pub struct Impersonator {
    client: reqwest::Client,
    config: AuthConfig,
    iam_endpoint: String,
    metadata_endpoint: String,
}

impl Impersonator {
    /// Create an impersonator using the public Google endpoints
    pub fn new(client: reqwest::Client, config: AuthConfig) -> Self {
        Self {
            client,
            config,
            iam_endpoint: IAM_CREDENTIALS_ENDPOINT.to_string(),
            metadata_endpoint: METADATA_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Override the IAM Credentials endpoint
    pub fn with_iam_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.iam_endpoint = endpoint.into();
        self
    }

    /// Override the metadata server endpoint
    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint = endpoint.into();
        self
    }

    /// Impersonation settings in use
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn generate_token_url(&self) -> String {
        format!(
            "{}/projects/-/serviceAccounts/{}:generateAccessToken",
            self.iam_endpoint.trim_end_matches('/'),
            self.config.target_principal
        )
    }

    /// The caller's own token: environment first, then the metadata server
    pub async fn source_token(&self) -> Result<AccessToken, SourceError> {
        if let Ok(secret) = std::env::var(&self.config.source_token_env) {
            let secret = secret.trim();
            if !secret.is_empty() {
                tracing::debug!(env = %self.config.source_token_env, "using source token from environment");
                return Ok(AccessToken::new(secret, None));
            }
        }

        tracing::debug!("requesting source token from metadata server");
        let response = self
            .client
            .get(&self.metadata_endpoint)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                SourceError::Authentication(format!(
                    "no source credentials: {} is unset and the metadata server is unreachable ({})",
                    self.config.source_token_env, e
                ))
            })?;

        let body: MetadataTokenResponse = response
            .error_for_status()
            .map_err(|e| SourceError::Authentication(format!("metadata server refused token: {}", e)))?
            .json()
            .await
            .map_err(|e| SourceError::Authentication(format!("invalid metadata token response: {}", e)))?;

        Ok(AccessToken::new(body.access_token, None))
    }

    /// Exchange the source token for an impersonated session
    pub async fn impersonate(&self) -> Result<GoogleSession, SourceError> {
        let source = self.source_token().await?;

        let request = GenerateAccessTokenRequest {
            scope: &self.config.scopes,
            lifetime: format!("{}s", self.config.lifetime_secs),
        };

        let response = self
            .client
            .post(self.generate_token_url())
            .bearer_auth(source.secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Authentication(format!("impersonation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Authentication(format!(
                "impersonating {} failed with HTTP {}: {}",
                self.config.target_principal, status, detail
            )));
        }

        let body: GenerateAccessTokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Authentication(format!("invalid impersonation response: {}", e)))?;

        tracing::info!(
            principal = %self.config.target_principal,
            expires_at = body.expire_time.as_deref().unwrap_or("unknown"),
            "impersonated credentials issued"
        );

        Ok(GoogleSession::new(AccessToken::new(
            body.access_token,
            body.expire_time,
        )))
    }
}
