use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw spot prices (USD per troy ounce) as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPrices {
    pub gold: f64,
    pub silver: f64,
    pub timestamp: DateTime<Utc>,
}

/// `GET /v1/latest` from metals.dev. Older payloads put the prices at the top level.
#[derive(Debug, Clone, Deserialize)]
pub struct MetalsLatestResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metals: Option<MetalPrices>,
    #[serde(default)]
    pub gold: Option<f64>,
    #[serde(default)]
    pub silver: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub timestamps: Option<MetalsTimestamps>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetalPrices {
    pub gold: Option<f64>,
    pub silver: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetalsTimestamps {
    pub metal: Option<String>,
}

/// USD/KRW exchange rate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub rate: f64,
    pub base: String,
    pub target: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// `GET /v6/{key}/latest/USD` from ExchangeRate-API.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRateResponse {
    pub result: String,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default)]
    pub time_last_update_utc: Option<String>,
    #[serde(default)]
    pub conversion_rates: Option<std::collections::BTreeMap<String, f64>>,
}

/// `GET /latest?base=USD&symbols=KRW` from exchangerate.host (keyless).
#[derive(Debug, Clone, Deserialize)]
pub struct KeylessRateResponse {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rates: Option<std::collections::BTreeMap<String, f64>>,
}
