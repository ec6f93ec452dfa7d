use chrono::{DateTime, Utc};
use geumeun_core::domain::market::{MarketDataSnapshot, Metal, MetalQuote};

/// Prices given on the command line, USD per troy ounce.
#[derive(Debug, Clone, Copy)]
pub struct ManualPrices {
    pub gold: f64,
    pub silver: f64,
    /// Day-over-day change in percent.
    pub gold_change_percent: f64,
    pub silver_change_percent: f64,
}

pub fn manual_snapshot(
    prices: ManualPrices,
    now: DateTime<Utc>,
) -> anyhow::Result<MarketDataSnapshot> {
    Ok(MarketDataSnapshot {
        gold: manual_quote(Metal::Gold, prices.gold, prices.gold_change_percent, now)?,
        silver: manual_quote(Metal::Silver, prices.silver, prices.silver_change_percent, now)?,
    })
}

// The absolute change is derived from the previous close implied by the percent.
fn manual_quote(
    metal: Metal,
    price: f64,
    change_percent: f64,
    now: DateTime<Utc>,
) -> anyhow::Result<MetalQuote> {
    anyhow::ensure!(
        price.is_finite() && price > 0.0,
        "{metal} price must be positive (got {price})"
    );
    anyhow::ensure!(
        change_percent.is_finite() && change_percent > -100.0,
        "{metal} change percent must be above -100 (got {change_percent})"
    );

    let previous = price / (1.0 + change_percent / 100.0);
    Ok(MetalQuote::new(metal, price, price - previous, change_percent, now))
}
