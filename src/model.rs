//! Data models for the ads gateway
//!
//! This module defines the request parameters, the JSON envelopes returned by every
//! route, and the rows decoded from the advertising API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Failure envelope shared by every route
///
/// # Example
/// ```json
/// { "ok": false, "error": "credentials file not found: /etc/secrets/google-ads.yaml" }
/// ```
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: String,
}

/// Response of `GET /`
#[derive(Serialize, Debug)]
pub struct RootResponse {
    pub ok: bool,
    pub service: &'static str,
}

/// Response of `GET /ads/health`
///
/// `customers` holds resource names such as `customers/1234567890`.
#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub ok: bool,
    pub customers: Vec<String>,
}

/// Query parameters for `GET /ads/campaigns`
///
/// # Example
/// Query string: `?start=2024-01-01&end=2024-01-31&customer_id=123-456-7890`
#[derive(Deserialize, Debug)]
pub struct CampaignParams {
    /// First day of the range (`YYYY-MM-DD`), passed to the query untouched
    pub start: String,

    /// Last day of the range (`YYYY-MM-DD`), passed to the query untouched
    pub end: String,

    /// Optional account id; defaults to the one in the credentials file
    pub customer_id: Option<String>,
}

/// Response of `GET /ads/campaigns`
#[derive(Serialize, Debug)]
pub struct CampaignsResponse {
    pub ok: bool,
    pub customer_id: String,
    pub rows: Vec<CampaignRow>,
}

/// One flattened campaign metrics row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CampaignRow {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub impressions: i64,
    pub clicks: i64,

    /// Cost in currency units (vendor micros / 1,000,000)
    pub cost: f64,
}

/// Response of `GET /ads/debug-config`
#[derive(Serialize, Debug, PartialEq)]
pub struct DebugConfigResponse {
    pub path_exists: bool,
    pub keys_present: Vec<String>,
    pub refresh_token_masked: String,
}

/// Query parameters the identity provider appends to the redirect URI
#[derive(Deserialize, Debug)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// Response of `GET /oauth2/callback`
///
/// The refresh token is handed back once and never stored by the gateway.
#[derive(Serialize, Debug)]
pub struct CallbackResponse {
    pub ok: bool,
    pub refresh_token: Option<String>,
    pub access_token: String,
    pub expiry: Option<DateTime<Utc>>,
    pub note: &'static str,
}

/// One entry of `results` returned by the `googleAds:search` endpoint
///
/// The vendor encodes int64 values as JSON strings and omits fields holding zero,
/// so every numeric field accepts both forms and defaults to 0.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRow {
    #[serde(default)]
    pub campaign: CampaignFields,
    #[serde(default)]
    pub metrics: MetricFields,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFields {
    #[serde(default, deserialize_with = "int64")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricFields {
    #[serde(default, deserialize_with = "int64")]
    pub impressions: i64,
    #[serde(default, deserialize_with = "int64")]
    pub clicks: i64,
    #[serde(default, deserialize_with = "int64")]
    pub cost_micros: i64,
}

fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_row_accepts_string_int64() {
        let row: SearchRow = serde_json::from_value(json!({
            "campaign": { "resourceName": "customers/1/campaigns/10", "id": "10", "name": "X" },
            "metrics": { "impressions": "100", "clicks": "5", "costMicros": "3000000" }
        }))
        .unwrap();

        assert_eq!(row.campaign.id, 10);
        assert_eq!(row.campaign.name, "X");
        assert_eq!(row.metrics.impressions, 100);
        assert_eq!(row.metrics.clicks, 5);
        assert_eq!(row.metrics.cost_micros, 3_000_000);
    }

    #[test]
    fn test_search_row_defaults_omitted_metrics() {
        let row: SearchRow = serde_json::from_value(json!({
            "campaign": { "id": 7, "name": "Quiet" },
            "metrics": {}
        }))
        .unwrap();

        assert_eq!(row.campaign.id, 7);
        assert_eq!(row.metrics.clicks, 0);
        assert_eq!(row.metrics.cost_micros, 0);
    }
}
