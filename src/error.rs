//! Error taxonomy for the gateway
//!
//! Every failure a route can produce is one of these kinds. The `Display` text is what
//! callers see in the `error` field of the `{ok: false, error}` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::model::ErrorEnvelope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Credentials file does not exist at the configured path
    #[error("credentials file not found: {0}")]
    ConfigMissing(String),

    /// Credentials file exists but is not a usable YAML mapping
    #[error("credentials file is malformed: {0}")]
    ConfigMalformed(String),

    #[error("no client_customer_id/login_customer_id found in google-ads.yaml")]
    MissingAccountId,

    #[error("OAuth configuration error: {0}")]
    MissingOAuthConfig(String),

    #[error("missing `code` query parameter")]
    MissingAuthCode,

    /// Structured failure reported by the advertising API
    #[error("{0}")]
    UpstreamApi(String),

    /// Failure reported by the OAuth token endpoint
    #[error("{0}")]
    UpstreamOAuth(String),

    #[error("{0}")]
    Unknown(String),
}

impl AppError {
    /// HTTP status used when the error is rendered on its own.
    ///
    /// Reporting routes ignore this and always answer 200.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthCode => StatusCode::BAD_REQUEST,
            Self::UpstreamOAuth(_) => StatusCode::BAD_GATEWAY,
            Self::MissingOAuthConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }

    pub fn envelope(&self) -> Json<ErrorEnvelope> {
        Json(ErrorEnvelope {
            ok: false,
            error: self.to_string(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.envelope()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unknown(e.to_string())
    }
}
