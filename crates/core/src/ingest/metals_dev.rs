use crate::config::Settings;
use crate::ingest::provider::MarketQuoteSource;
use crate::ingest::types::{MetalsLatestResponse, SpotPrices};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRIES: u32 = 3;
const LATEST_PATH: &str = "/v1/latest";

#[derive(Debug, Clone)]
pub struct MetalsDevClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retries: u32,
}

impl MetalsDevClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_metals_api_key()?.to_string();

        let timeout_secs = std::env::var("METALS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("METALS_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        Self::new(&settings.metals_api_base_url, api_key, timeout_secs, retries)
    }

    pub fn new(base_url: &str, api_key: String, timeout_secs: u64, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build metals.dev http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retries: retries.max(1),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, LATEST_PATH)
    }

    async fn fetch_once(&self) -> Result<MetalsLatestResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let res = self
            .http
            .get(self.url())
            .headers(headers)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("currency", "USD"),
                ("unit", "toz"),
            ])
            .send()
            .await
            .context("metals.dev request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read metals.dev response")?;

        if !status.is_success() {
            anyhow::bail!("metals.dev HTTP {status}: {text}");
        }

        serde_json::from_str::<MetalsLatestResponse>(&text)
            .with_context(|| format!("metals.dev response is not valid JSON: {text}"))
    }
}

#[async_trait::async_trait]
impl MarketQuoteSource for MetalsDevClient {
    fn provider_name(&self) -> &'static str {
        "metals_dev"
    }

    async fn fetch_latest_prices(&self) -> Result<SpotPrices> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once().await {
                Ok(parsed) => return into_spot_prices(parsed, Utc::now()),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        attempt,
                        ?backoff,
                        error = %err,
                        "metals.dev fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn into_spot_prices(resp: MetalsLatestResponse, now: DateTime<Utc>) -> Result<SpotPrices> {
    if let Some(status) = resp.status.as_deref() {
        anyhow::ensure!(status == "success", "metals.dev status: {status}");
    }

    let gold = resp
        .metals
        .as_ref()
        .and_then(|m| m.gold)
        .or(resp.gold)
        .unwrap_or(0.0);
    let silver = resp
        .metals
        .as_ref()
        .and_then(|m| m.silver)
        .or(resp.silver)
        .unwrap_or(0.0);

    anyhow::ensure!(
        gold.is_finite() && gold > 0.0 && silver.is_finite() && silver > 0.0,
        "metals.dev response has no valid prices (gold={gold}, silver={silver})"
    );

    let timestamp = resp
        .timestamp
        .as_deref()
        .or_else(|| resp.timestamps.as_ref().and_then(|t| t.metal.as_deref()))
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now);

    Ok(SpotPrices {
        gold,
        silver,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap()
    }

    #[test]
    fn reads_nested_prices_and_timestamp() {
        let resp: MetalsLatestResponse = serde_json::from_value(json!({
            "status": "success",
            "currency": "USD",
            "unit": "toz",
            "metals": {"gold": 2650.25, "silver": 31.4, "platinum": 950.0},
            "timestamps": {"metal": "2026-01-26T23:59:00.000Z"}
        }))
        .unwrap();

        let spot = into_spot_prices(resp, now()).unwrap();
        assert_eq!(spot.gold, 2650.25);
        assert_eq!(spot.silver, 31.4);
        assert_eq!(
            spot.timestamp,
            Utc.with_ymd_and_hms(2026, 1, 26, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn falls_back_to_top_level_prices() {
        let resp: MetalsLatestResponse =
            serde_json::from_value(json!({"gold": 2000.0, "silver": 25.0})).unwrap();
        let spot = into_spot_prices(resp, now()).unwrap();
        assert_eq!(spot.gold, 2000.0);
        assert_eq!(spot.timestamp, now());
    }

    #[test]
    fn rejects_missing_or_zero_prices() {
        let resp: MetalsLatestResponse =
            serde_json::from_value(json!({"metals": {"gold": 2000.0, "silver": 0.0}})).unwrap();
        assert!(into_spot_prices(resp, now()).is_err());

        let resp: MetalsLatestResponse =
            serde_json::from_value(json!({
                "status": "failure",
                "metals": {"gold": 1.0, "silver": 1.0}
            }))
            .unwrap();
        assert!(into_spot_prices(resp, now()).is_err());
    }

    #[tokio::test]
    async fn fetches_latest_prices_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("unit", "toz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "metals": {"gold": 2000.0, "silver": 25.0}
            })))
            .mount(&server)
            .await;

        let client = MetalsDevClient::new(&server.uri(), "test-key".to_string(), 5, 1).unwrap();
        let spot = client.fetch_latest_prices().await.unwrap();
        assert_eq!(spot.gold, 2000.0);
        assert_eq!(spot.silver, 25.0);
    }

    #[tokio::test]
    async fn surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = MetalsDevClient::new(&server.uri(), "bad".to_string(), 5, 1).unwrap();
        let err = client.fetch_latest_prices().await.unwrap_err();
        assert!(format!("{err:#}").contains("401"));
    }
}
