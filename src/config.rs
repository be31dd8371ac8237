//! Configuration loading
//!
//! Two sources feed the gateway:
//! - process settings (`Settings`), read once at start-up from the environment
//! - the credentials record (`google-ads.yaml`), re-read from disk on every request

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use url::Url;

use crate::error::AppError;

pub const DEFAULT_CREDENTIALS_PATH: &str = "/etc/secrets/google-ads.yaml";
pub const DEFAULT_ADS_ENDPOINT: &str = "https://googleads.googleapis.com/v18";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Process-wide settings shared by every handler
///
/// # Environment Variables
///
/// - `GOOGLE_ADS_YAML_PATH` - credentials file (default: `/etc/secrets/google-ads.yaml`)
/// - `GOOGLE_ADS_ENDPOINT` - versioned base URL of the advertising REST API
/// - `GOOGLE_OAUTH_CLIENT_ID`, `GOOGLE_OAUTH_CLIENT_SECRET`, `GOOGLE_OAUTH_REDIRECT_URI`
/// - `GOOGLE_OAUTH_AUTH_URL`, `GOOGLE_OAUTH_TOKEN_URL` - identity provider overrides
/// - `GATEWAY_AUTHORIZATION` - optional shared secret for `/ads/*`
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials_path: PathBuf,
    pub ads_endpoint: String,
    pub oauth: OAuthSettings,

    /// When set, `/ads/*` requires a matching `Authorization` header
    pub authorization: Option<String>,
}

/// Raw OAuth values as found in the environment
///
/// Validation is deferred to [`Settings::oauth_client_config`] so the reporting
/// routes keep working on a deployment without OAuth configured.
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub auth_url: String,
    pub token_url: String,
}

/// Validated OAuth client identity and provider endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Url,
    pub auth_endpoint: Url,
    pub token_endpoint: Url,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            credentials_path: get("GOOGLE_ADS_YAML_PATH")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
            ads_endpoint: get("GOOGLE_ADS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ADS_ENDPOINT.to_string()),
            oauth: OAuthSettings {
                client_id: get("GOOGLE_OAUTH_CLIENT_ID"),
                client_secret: get("GOOGLE_OAUTH_CLIENT_SECRET"),
                redirect_uri: get("GOOGLE_OAUTH_REDIRECT_URI"),
                auth_url: get("GOOGLE_OAUTH_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                token_url: get("GOOGLE_OAUTH_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            },
            authorization: get("GATEWAY_AUTHORIZATION"),
        }
    }

    /// Validates the OAuth client identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingOAuthConfig`] naming the first variable that is
    /// absent or empty, or whose value is not a URL where one is required.
    pub fn oauth_client_config(&self) -> Result<OAuthClientConfig, AppError> {
        let oauth = &self.oauth;
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| AppError::MissingOAuthConfig(format!("{name} is required")))
        };
        let parse = |value: &str, name: &str| {
            Url::parse(value)
                .map_err(|e| AppError::MissingOAuthConfig(format!("{name}: {e}")))
        };

        let client_id = required(&oauth.client_id, "GOOGLE_OAUTH_CLIENT_ID")?;
        let client_secret = required(&oauth.client_secret, "GOOGLE_OAUTH_CLIENT_SECRET")?;
        let redirect_uri = required(&oauth.redirect_uri, "GOOGLE_OAUTH_REDIRECT_URI")?;

        Ok(OAuthClientConfig {
            client_id,
            client_secret,
            redirect_uri: parse(&redirect_uri, "GOOGLE_OAUTH_REDIRECT_URI")?,
            auth_endpoint: parse(&oauth.auth_url, "GOOGLE_OAUTH_AUTH_URL")?,
            token_endpoint: parse(&oauth.token_url, "GOOGLE_OAUTH_TOKEN_URL")?,
        })
    }
}

/// Reads the OAuth client identity straight from the process environment.
pub fn load_oauth_client_config() -> Result<OAuthClientConfig, AppError> {
    Settings::from_env().oauth_client_config()
}

/// Parsed contents of `google-ads.yaml`
///
/// Kept as the raw top-level mapping so unknown keys survive for diagnostics.
/// Required fields are checked by whoever needs them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialsRecord {
    entries: Mapping,
}

impl CredentialsRecord {
    /// Parses YAML text. An empty document yields an empty record.
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_yaml::from_str::<Value>(text) {
            Ok(Value::Mapping(entries)) => Ok(Self { entries }),
            Ok(Value::Null) => Ok(Self::default()),
            Ok(_) => Err(AppError::ConfigMalformed(
                "top level is not a mapping".to_string(),
            )),
            Err(e) => Err(AppError::ConfigMalformed(e.to_string())),
        }
    }

    /// Top-level keys in file order
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter_map(|k| match k {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Scalar value of `key` as a trimmed, non-empty string.
    ///
    /// Numbers are rendered in decimal, so an unquoted `login_customer_id: 1234567890`
    /// reads the same as a quoted one.
    pub fn get(&self, key: &str) -> Option<String> {
        let text = match self.entries.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn developer_token(&self) -> Option<String> {
        self.get("developer_token")
    }

    pub fn client_id(&self) -> Option<String> {
        self.get("client_id")
    }

    pub fn client_secret(&self) -> Option<String> {
        self.get("client_secret")
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get("refresh_token")
    }

    pub fn login_customer_id(&self) -> Option<String> {
        self.get("login_customer_id")
            .map(|id| strip_separators(&id))
            .filter(|id| !id.is_empty())
    }

    /// Default account: `client_customer_id`, falling back to `login_customer_id`
    pub fn default_account_id(&self) -> Option<String> {
        ["client_customer_id", "login_customer_id"]
            .into_iter()
            .find_map(|key| {
                self.get(key)
                    .map(|id| strip_separators(&id))
                    .filter(|id| !id.is_empty())
            })
    }
}

/// Loads the credentials record from `path`.
///
/// # Errors
///
/// - [`AppError::ConfigMissing`] if the file does not exist
/// - [`AppError::ConfigMalformed`] if it is not UTF-8 text holding a YAML mapping
/// - [`AppError::Unknown`] for any other read failure
pub fn load_credentials(path: &Path) -> Result<CredentialsRecord, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::ConfigMissing(path.display().to_string()),
        ErrorKind::InvalidData => AppError::ConfigMalformed(format!("{}: {e}", path.display())),
        _ => AppError::Unknown(format!("cannot read {}: {e}", path.display())),
    })?;
    CredentialsRecord::from_yaml(&text)
}

/// Picks the account to query.
///
/// An explicit id wins when it still has content after stripping separators;
/// otherwise the record's default account is used.
pub fn resolve_account_id(
    explicit: Option<&str>,
    record: &CredentialsRecord,
) -> Result<String, AppError> {
    explicit
        .map(strip_separators)
        .filter(|id| !id.is_empty())
        .or_else(|| record.default_account_id())
        .ok_or(AppError::MissingAccountId)
}

/// Removes dashes and whitespace, e.g. `123-456-7890` -> `1234567890`
pub fn strip_separators(id: &str) -> String {
    id.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect()
}
