use crate::domain::market::{HistoricalSeries, Metal};
use crate::ingest::types::{FxRate, SpotPrices};
use anyhow::Result;

pub const DEFAULT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_STEP_DAYS: u32 = 7;

/// Source of current spot prices for gold and silver.
#[async_trait::async_trait]
pub trait MarketQuoteSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_latest_prices(&self) -> Result<SpotPrices>;
}

/// Source of trailing price history. An empty series or an error means
/// "no analysis" for that metal, never a failed evaluation.
#[async_trait::async_trait]
pub trait HistoricalSeriesProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_series(
        &self,
        metal: Metal,
        window_days: u32,
        step_days: u32,
    ) -> Result<HistoricalSeries>;
}

#[async_trait::async_trait]
pub trait FxRateSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_usd_krw(&self) -> Result<FxRate>;
}
