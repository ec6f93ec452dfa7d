use crate::config::Settings;
use crate::ingest::provider::FxRateSource;
use crate::ingest::types::{ExchangeRateResponse, FxRate, KeylessRateResponse};
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// ExchangeRate-API when a key is configured, exchangerate.host otherwise.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    keyless_url: String,
}

impl ExchangeRateClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.exchange_rate_api_base_url,
            settings.exchange_rate_api_key.clone(),
            &settings.exchange_rate_fallback_url,
        )
    }

    pub fn new(base_url: &str, api_key: Option<String>, keyless_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build exchange rate http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            keyless_url: keyless_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_keyed(&self, api_key: &str) -> Result<FxRate> {
        let url = format!("{}/v6/{}/latest/USD", self.base_url, api_key);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("exchange rate request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "exchange rate HTTP {status}");

        let body: ExchangeRateResponse = res
            .json()
            .await
            .context("failed to parse exchange rate response")?;
        keyed_rate(body)
    }

    async fn fetch_keyless(&self) -> Result<FxRate> {
        let url = format!("{}/latest", self.keyless_url);
        let res = self
            .http
            .get(url)
            .query(&[("base", "USD"), ("symbols", "KRW")])
            .send()
            .await
            .context("keyless exchange rate request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "keyless exchange rate HTTP {status}");

        let body: KeylessRateResponse = res
            .json()
            .await
            .context("failed to parse keyless exchange rate response")?;
        let rate = body
            .rates
            .as_ref()
            .and_then(|r| r.get("KRW").copied())
            .context("keyless exchange rate response has no KRW rate")?;

        Ok(FxRate {
            rate,
            base: "USD".to_string(),
            target: "KRW".to_string(),
            timestamp: body
                .date
                .unwrap_or_else(|| Utc::now().date_naive().to_string()),
            warning: Some("Using fallback API (no API key)".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl FxRateSource for ExchangeRateClient {
    fn provider_name(&self) -> &'static str {
        if self.api_key.is_some() {
            "exchangerate_api"
        } else {
            "exchangerate_host"
        }
    }

    async fn fetch_usd_krw(&self) -> Result<FxRate> {
        match self.api_key.as_deref() {
            Some(key) => self.fetch_keyed(key).await,
            None => self.fetch_keyless().await,
        }
    }
}

fn keyed_rate(body: ExchangeRateResponse) -> Result<FxRate> {
    if body.result != "success" {
        anyhow::bail!(
            "exchange rate API error: {}",
            body.error_type
                .as_deref()
                .unwrap_or("API request was not successful")
        );
    }

    let rate = body
        .conversion_rates
        .as_ref()
        .and_then(|r| r.get("KRW").copied())
        .context("Invalid API response: missing rates data")?;

    Ok(FxRate {
        rate,
        base: body.base_code.unwrap_or_else(|| "USD".to_string()),
        target: "KRW".to_string(),
        timestamp: body
            .time_last_update_utc
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
        warning: None,
    })
}
