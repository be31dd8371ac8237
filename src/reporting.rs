//! Read-only reporting on top of the advertising API
//!
//! Each operation loads the credentials record, connects, performs at most one
//! upstream call, and reshapes the answer for the JSON routes.

use std::path::Path;

use crate::ads::{AdsApi, AdsConnector};
use crate::config::{load_credentials, resolve_account_id};
use crate::error::AppError;
use crate::model::{CampaignRow, DebugConfigResponse, SearchRow};

const MICROS_PER_UNIT: f64 = 1_000_000.0;
const MASK_EDGE: usize = 6;
const MASK_PLACEHOLDER: &str = "...";

/// Campaign metrics for one account
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignReport {
    pub customer_id: String,
    pub rows: Vec<CampaignRow>,
}

/// Resource names of every account reachable with the stored credentials.
pub async fn health<C: AdsConnector>(
    credentials_path: &Path,
    connector: &C,
) -> Result<Vec<String>, AppError> {
    let credentials = load_credentials(credentials_path)?;
    let client = connector.connect(&credentials)?;
    client.list_accessible_customers().await
}

/// Campaign metrics between `start` and `end` (inclusive) for one account.
///
/// `start`/`end` go into the query as given; the advertising API validates them.
pub async fn campaigns<C: AdsConnector>(
    credentials_path: &Path,
    connector: &C,
    start: &str,
    end: &str,
    customer_id: Option<&str>,
) -> Result<CampaignReport, AppError> {
    let credentials = load_credentials(credentials_path)?;
    let client = connector.connect(&credentials)?;
    let customer_id = resolve_account_id(customer_id, &credentials)?;

    let query = campaign_metrics_query(start, end);
    let rows = client
        .search(&customer_id, &query)
        .await?
        .into_iter()
        .map(CampaignRow::from)
        .collect();

    Ok(CampaignReport { customer_id, rows })
}

// TODO: reject start/end values that are not YYYY-MM-DD before they reach the query text.
pub fn campaign_metrics_query(start: &str, end: &str) -> String {
    format!(
        "SELECT campaign.id, campaign.name, metrics.impressions, metrics.clicks, metrics.cost_micros \
         FROM campaign \
         WHERE segments.date BETWEEN '{start}' AND '{end}' \
         ORDER BY campaign.id \
         LIMIT 100"
    )
}

pub fn micros_to_units(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT
}

impl From<SearchRow> for CampaignRow {
    fn from(row: SearchRow) -> Self {
        Self {
            campaign_id: row.campaign.id,
            campaign_name: row.campaign.name,
            impressions: row.metrics.impressions,
            clicks: row.metrics.clicks,
            cost: micros_to_units(row.metrics.cost_micros),
        }
    }
}

/// Diagnostic view of the credentials file. Never fails and never exposes the
/// refresh token.
pub fn debug_config(credentials_path: &Path) -> DebugConfigResponse {
    let record = load_credentials(credentials_path).ok();

    DebugConfigResponse {
        path_exists: credentials_path.exists(),
        keys_present: record.as_ref().map(|r| r.keys()).unwrap_or_default(),
        refresh_token_masked: record
            .and_then(|r| r.refresh_token())
            .map(|token| mask_secret(&token))
            .unwrap_or_default(),
    }
}

/// First and last six characters joined by `...`; empty when the secret is too
/// short to mask without revealing most of it.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < MASK_EDGE * 2 {
        return String::new();
    }
    let head: String = chars[..MASK_EDGE].iter().collect();
    let tail: String = chars[chars.len() - MASK_EDGE..].iter().collect();
    format!("{head}{MASK_PLACEHOLDER}{tail}")
}
