//! Advertising API access
//!
//! Handlers never talk to the network directly. They go through [`AdsConnector`],
//! which turns a freshly loaded credentials record into an [`AdsApi`] client.
//! Production uses [`GoogleAdsConnector`]; tests plug in a fake.

use std::future::Future;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::CredentialsRecord;
use crate::error::AppError;
use crate::model::SearchRow;

/// Read-only operations the gateway needs from the advertising platform.
pub trait AdsApi: Send + Sync {
    /// Resource names of every account the credentials can reach
    fn list_accessible_customers(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    /// Runs a query against one account and returns the decoded rows
    fn search(
        &self,
        customer_id: &str,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchRow>, AppError>> + Send;
}

/// Builds an [`AdsApi`] client for one request.
pub trait AdsConnector: Send + Sync + 'static {
    type Client: AdsApi;

    fn connect(&self, credentials: &CredentialsRecord) -> Result<Self::Client, AppError>;
}

/// Connector for the Google Ads REST interface
#[derive(Debug, Clone)]
pub struct GoogleAdsConnector {
    http: Client,
    endpoint: String,
    token_url: String,
}

impl GoogleAdsConnector {
    /// `endpoint` is the versioned base, e.g. `https://googleads.googleapis.com/v18`.
    /// `token_url` is where refresh tokens are traded for access tokens.
    pub fn new(endpoint: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        }
    }

    /// Use a custom HTTP client (for timeouts or proxies).
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }
}

impl AdsConnector for GoogleAdsConnector {
    type Client = GoogleAdsClient;

    fn connect(&self, credentials: &CredentialsRecord) -> Result<GoogleAdsClient, AppError> {
        let required = |value: Option<String>, key: &str| {
            value.ok_or_else(|| {
                AppError::ConfigMalformed(format!("missing required key `{key}`"))
            })
        };

        Ok(GoogleAdsClient {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            token_url: self.token_url.clone(),
            developer_token: required(credentials.developer_token(), "developer_token")?,
            client_id: required(credentials.client_id(), "client_id")?,
            client_secret: required(credentials.client_secret(), "client_secret")?,
            refresh_token: required(credentials.refresh_token(), "refresh_token")?,
            login_customer_id: credentials.login_customer_id(),
        })
    }
}

/// Per-request client holding the identity read from the credentials file
pub struct GoogleAdsClient {
    http: Client,
    endpoint: String,
    token_url: String,
    developer_token: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    login_customer_id: Option<String>,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccessibleCustomersResponse {
    #[serde(default)]
    resource_names: Vec<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRow>,
}

impl GoogleAdsClient {
    async fn access_token(&self) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamOAuth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::UpstreamOAuth(format!("read token response: {e}")))?;
        if !status.is_success() {
            return Err(AppError::UpstreamOAuth(crate::oauth::token_error_message(
                &body,
            )));
        }

        let token: AccessToken = serde_json::from_str(&body)
            .map_err(|e| AppError::UpstreamOAuth(format!("decode token response: {e}")))?;
        Ok(token.access_token)
    }

    fn authorize(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        let request = request
            .bearer_auth(access_token)
            .header("developer-token", &self.developer_token);
        match &self.login_customer_id {
            Some(login) => request.header("login-customer-id", login),
            None => request,
        }
    }
}

impl AdsApi for GoogleAdsClient {
    async fn list_accessible_customers(&self) -> Result<Vec<String>, AppError> {
        let access_token = self.access_token().await?;
        let url = format!("{}/customers:listAccessibleCustomers", self.endpoint);

        let response = self
            .authorize(self.http.get(url), &access_token)
            .send()
            .await?;
        let body: ListAccessibleCustomersResponse = ensure_success(response).await?.json().await?;
        Ok(body.resource_names)
    }

    async fn search(&self, customer_id: &str, query: &str) -> Result<Vec<SearchRow>, AppError> {
        let access_token = self.access_token().await?;
        let url = format!("{}/customers/{customer_id}/googleAds:search", self.endpoint);
        tracing::debug!(customer_id, query, "googleAds:search");

        let response = self
            .authorize(self.http.post(url), &access_token)
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let body: SearchResponse = ensure_success(response).await?.json().await?;
        Ok(body.results)
    }
}

/// Passes 2xx responses through; anything else becomes [`AppError::UpstreamApi`].
async fn ensure_success(response: Response) -> Result<Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, "advertising API rejected the request");
    Err(AppError::UpstreamApi(failure_message(&body)))
}

/// Extracts the most specific failure message from a Google API error body.
///
/// Prefers the first `GoogleAdsFailure` error, then the top-level status message,
/// then the raw body.
pub fn failure_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let error = &value["error"];

    let detail = error["details"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|d| d["errors"].as_array())
        .flatten()
        .find_map(|e| e["message"].as_str());

    detail
        .or_else(|| error["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
