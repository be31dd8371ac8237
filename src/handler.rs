//! HTTP request handlers for the ads gateway
//!
//! This module maps routes onto the reporting and OAuth operations:
//! - Listing accessible accounts and campaign metrics
//! - Inspecting the credentials file without exposing secrets
//! - Running the OAuth2 authorization-code exchange

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::ads::AdsConnector;
use crate::error::AppError;
use crate::model::{
    CallbackParams, CallbackResponse, CampaignParams, CampaignsResponse, HealthResponse,
    RootResponse,
};
use crate::oauth::authorization_url;
use crate::reporting;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "ads-gateway";

const REFRESH_TOKEN_NOTE: &str =
    "Copy refresh_token into google-ads.yaml; this service does not store it.";

/// Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        ok: true,
        service: SERVICE_NAME,
    })
}

/// Verifies the stored credentials by listing accessible accounts
///
/// # Response
///
/// - **200 OK** `{ "ok": true, "customers": ["customers/1234567890"] }`
/// - **200 OK** `{ "ok": false, "error": "..." }` on any failure
///
/// Health checks must not fail at the HTTP level, so every error is folded
/// into the envelope.
pub async fn ads_health<C: AdsConnector>(State(state): State<AppState<C>>) -> Response {
    match reporting::health(&state.settings.credentials_path, state.ads.as_ref()).await {
        Ok(customers) => {
            tracing::info!(count = customers.len(), "listed accessible customers");
            Json(HealthResponse {
                ok: true,
                customers,
            })
            .into_response()
        }
        Err(err) => envelope_ok(err),
    }
}

/// Campaign metrics for a date range
///
/// # Query Parameters
///
/// - `start` (required) - first day, `YYYY-MM-DD`
/// - `end` (required) - last day, `YYYY-MM-DD`
/// - `customer_id` (optional) - dashes allowed; defaults to the credentials file
///
/// # Example Request
///
/// `GET /ads/campaigns?start=2024-01-01&end=2024-01-31&customer_id=123-456-7890`
///
/// # Response
///
/// ```json
/// {
///   "ok": true,
///   "customer_id": "1234567890",
///   "rows": [
///     { "campaign_id": 10, "campaign_name": "X", "impressions": 100, "clicks": 5, "cost": 3.0 }
///   ]
/// }
/// ```
///
/// Missing `start`/`end` is rejected by the query extractor before anything
/// else runs. All other failures answer 200 with `ok: false`.
pub async fn ads_campaigns<C: AdsConnector>(
    State(state): State<AppState<C>>,
    Query(params): Query<CampaignParams>,
) -> Response {
    let result = reporting::campaigns(
        &state.settings.credentials_path,
        state.ads.as_ref(),
        &params.start,
        &params.end,
        params.customer_id.as_deref(),
    )
    .await;

    match result {
        Ok(report) => {
            tracing::info!(
                customer_id = %report.customer_id,
                rows = report.rows.len(),
                "campaign metrics fetched"
            );
            Json(CampaignsResponse {
                ok: true,
                customer_id: report.customer_id,
                rows: report.rows,
            })
            .into_response()
        }
        Err(err) => envelope_ok(err),
    }
}

/// Reports which keys the credentials file holds, with the refresh token masked
pub async fn debug_config<C: AdsConnector>(State(state): State<AppState<C>>) -> Response {
    Json(reporting::debug_config(&state.settings.credentials_path)).into_response()
}

/// Starts the consent flow
///
/// # Response
///
/// - **302 Found** - `Location` points at the identity provider
/// - **500** `{ "ok": false, "error": "OAuth configuration error: ..." }`
pub async fn oauth_start<C: AdsConnector>(State(state): State<AppState<C>>) -> Response {
    match state.settings.oauth_client_config() {
        Ok(config) => {
            let url = authorization_url(&config);
            (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "cannot start OAuth flow");
            err.into_response()
        }
    }
}

/// Completes the consent flow by exchanging the authorization code
///
/// # Query Parameters
///
/// - `code` - authorization code appended by the identity provider
///
/// # Response
///
/// - **200 OK** `{ "ok": true, "refresh_token", "access_token", "expiry", "note" }`
/// - **400 Bad Request** - `code` is missing; no exchange is attempted
/// - **502 Bad Gateway** - the provider refused the code
///
/// The refresh token is returned in plaintext and never persisted here.
pub async fn oauth_callback<C: AdsConnector>(
    State(state): State<AppState<C>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>, AppError> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AppError::MissingAuthCode)?;
    let config = state.settings.oauth_client_config()?;

    let grant = state
        .oauth
        .exchange_code(&config, &code)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "authorization code exchange failed"))?;
    tracing::info!(
        has_refresh_token = grant.refresh_token.is_some(),
        "authorization code exchanged"
    );

    Ok(Json(CallbackResponse {
        ok: true,
        refresh_token: grant.refresh_token,
        access_token: grant.access_token,
        expiry: grant.expiry,
        note: REFRESH_TOKEN_NOTE,
    }))
}

/// Failure envelope with a 200 status, used by the reporting routes
fn envelope_ok(err: AppError) -> Response {
    tracing::warn!(error = %err, "request failed");
    (StatusCode::OK, err.envelope()).into_response()
}
