use crate::cache::{TimedCache, FX_TTL_HOURS};
use crate::ingest::provider::FxRateSource;
use crate::ingest::types::FxRate;
use crate::market::service::STALE_WARNING;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub const FALLBACK_USD_KRW: f64 = 1330.50;

/// USD/KRW with a 12-hour cache. Never fails: on upstream errors it serves
/// the last rate, or a fixed fallback rate when nothing was ever fetched.
pub struct FxService {
    source: Arc<dyn FxRateSource>,
    cache: TimedCache<(), FxRate>,
}

impl FxService {
    pub fn new(source: Arc<dyn FxRateSource>) -> Self {
        Self {
            source,
            cache: TimedCache::new(Duration::hours(FX_TTL_HOURS)),
        }
    }

    pub async fn usd_krw(&self, now: DateTime<Utc>) -> FxRate {
        if let Some(rate) = self.cache.fresh(&(), now) {
            return rate;
        }

        match self.source.fetch_usd_krw().await {
            Ok(rate) => {
                tracing::info!(
                    provider = self.source.provider_name(),
                    rate = rate.rate,
                    "fx rate refreshed"
                );
                self.cache.store((), rate.clone(), now);
                rate
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(
                    provider = self.source.provider_name(),
                    %error,
                    "fx rate fetch failed"
                );
                match self.cache.last() {
                    Some(mut rate) => {
                        rate.warning = Some(STALE_WARNING.to_string());
                        rate
                    }
                    None => FxRate {
                        rate: FALLBACK_USD_KRW,
                        base: "USD".to_string(),
                        target: "KRW".to_string(),
                        timestamp: now.to_rfc3339(),
                        warning: Some("Using mock data due to API error".to_string()),
                    },
                }
            }
        }
    }
}
