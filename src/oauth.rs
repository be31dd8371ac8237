//! OAuth2 authorization-code flow against the identity provider
//!
//! `/oauth2/start` sends the operator to the consent screen built by
//! [`authorization_url`]; `/oauth2/callback` trades the returned code through
//! [`OAuthClient::exchange_code`]. Nothing is stored between the two steps.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::OAuthClientConfig;
use crate::error::AppError;

/// Scope granting access to the advertising API
pub const ADS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Tokens issued for an authorization code
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Consent URL asking for offline access.
///
/// `prompt=consent` forces the provider to issue a new refresh token even when the
/// user already granted access once.
pub fn authorization_url(config: &OAuthClientConfig) -> Url {
    let mut url = config.auth_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", config.redirect_uri.as_str())
        .append_pair("scope", ADS_SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("include_granted_scopes", "true");
    url
}

/// Token endpoint client
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// The redirect URI must be the one used to build the consent URL, or the
    /// provider rejects the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UpstreamOAuth`] when the provider refuses the code or
    /// answers with something that is not a token response.
    pub async fn exchange_code(
        &self,
        config: &OAuthClientConfig,
        code: &str,
    ) -> Result<TokenGrant, AppError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(config.token_endpoint.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::UpstreamOAuth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::UpstreamOAuth(format!("read token response: {e}")))?;
        if !status.is_success() {
            return Err(AppError::UpstreamOAuth(token_error_message(&body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::UpstreamOAuth(format!("decode token response: {e}")))?;

        Ok(TokenGrant {
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expiry: token.expires_in.and_then(expiry_after),
        })
    }
}

/// Absolute expiry for a token valid `secs` seconds from now.
///
/// `None` when the lifetime does not fit a timestamp.
fn expiry_after(secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}

/// Renders an OAuth error body as `error: error_description` when possible.
pub fn token_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    match (value["error"].as_str(), value["error_description"].as_str()) {
        (Some(error), Some(description)) => format!("{error}: {description}"),
        (Some(error), None) => error.to_string(),
        _ => body.trim().to_string(),
    }
}
