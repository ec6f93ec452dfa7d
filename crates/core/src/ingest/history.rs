use crate::domain::market::{HistoricalDataPoint, HistoricalSeries, MarketDataSnapshot, Metal};
use crate::ingest::provider::HistoricalSeriesProvider;
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Fixed series per metal. Metals without a series yield an empty one.
#[derive(Debug, Clone, Default)]
pub struct StaticSeriesProvider {
    series: BTreeMap<Metal, HistoricalSeries>,
}

#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    gold: HistoricalSeries,
    #[serde(default)]
    silver: HistoricalSeries,
}

impl StaticSeriesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, metal: Metal, series: HistoricalSeries) -> Self {
        self.series.insert(metal, series);
        self
    }

    /// Parses `{"gold": [{"date": .., "price": ..}], "silver": [..]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: HistoryFile =
            serde_json::from_str(json).context("history file is not valid JSON")?;
        Ok(Self::new()
            .with_series(Metal::Gold, file.gold)
            .with_series(Metal::Silver, file.silver))
    }
}

#[async_trait::async_trait]
impl HistoricalSeriesProvider for StaticSeriesProvider {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_series(
        &self,
        metal: Metal,
        _window_days: u32,
        _step_days: u32,
    ) -> Result<HistoricalSeries> {
        Ok(self.series.get(&metal).cloned().unwrap_or_default())
    }
}

const DEFAULT_GOLD_ANCHOR: f64 = 2000.0;
const DEFAULT_SILVER_ANCHOR: f64 = 24.0;
const MAX_VARIATION: f64 = 0.10;

/// Demo history for deployments without a historical price API. Prices
/// wander within ±10% of the anchor; the wave is seeded by date and metal so
/// the same day always yields the same series.
#[derive(Debug, Clone)]
pub struct SimulatedSeriesProvider {
    today: NaiveDate,
    gold_anchor: f64,
    silver_anchor: f64,
}

impl SimulatedSeriesProvider {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            gold_anchor: DEFAULT_GOLD_ANCHOR,
            silver_anchor: DEFAULT_SILVER_ANCHOR,
        }
    }

    /// Anchors the simulation on the snapshot's current prices.
    pub fn anchored(snapshot: &MarketDataSnapshot, today: NaiveDate) -> Self {
        let pick = |price: f64, default: f64| {
            if price.is_finite() && price > 0.0 {
                price
            } else {
                default
            }
        };
        Self {
            today,
            gold_anchor: pick(snapshot.gold.price, DEFAULT_GOLD_ANCHOR),
            silver_anchor: pick(snapshot.silver.price, DEFAULT_SILVER_ANCHOR),
        }
    }

    fn anchor(&self, metal: Metal) -> f64 {
        match metal {
            Metal::Gold => self.gold_anchor,
            Metal::Silver => self.silver_anchor,
        }
    }

    fn variation(date: NaiveDate, metal: Metal) -> f64 {
        let salt = match metal {
            Metal::Gold => 0.0,
            Metal::Silver => 0.5,
        };
        let x = f64::from(date.num_days_from_ce()) + salt;
        MAX_VARIATION * ((x * 12.9898).sin() * 0.7 + (x * 0.21).sin() * 0.3)
    }
}

#[async_trait::async_trait]
impl HistoricalSeriesProvider for SimulatedSeriesProvider {
    fn provider_name(&self) -> &'static str {
        "simulated"
    }

    async fn fetch_series(
        &self,
        metal: Metal,
        window_days: u32,
        step_days: u32,
    ) -> Result<HistoricalSeries> {
        anyhow::ensure!(step_days >= 1, "step_days must be >= 1");

        let anchor = self.anchor(metal);
        let mut points = Vec::new();
        let mut offset = i64::from(window_days);
        while offset >= 0 {
            let date = self.today - Duration::days(offset);
            let price = anchor * (1.0 + Self::variation(date, metal));
            points.push(HistoricalDataPoint {
                date,
                price: (price * 100.0).round() / 100.0,
            });
            offset -= i64::from(step_days);
        }

        HistoricalSeries::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::provider::{DEFAULT_STEP_DAYS, DEFAULT_WINDOW_DAYS};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 27).unwrap()
    }

    #[tokio::test]
    async fn simulated_series_is_weekly_and_bounded() {
        let provider = SimulatedSeriesProvider::new(today());
        let s = provider
            .fetch_series(Metal::Gold, DEFAULT_WINDOW_DAYS, DEFAULT_STEP_DAYS)
            .await
            .unwrap();

        assert_eq!(s.len(), 13);
        assert_eq!(s.points()[0].date, today() - Duration::days(90));
        assert_eq!(s.points()[12].date, today() - Duration::days(6));
        for pair in s.points().windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 7);
        }
        for p in s.points() {
            assert!(p.price >= 1800.0 - 0.01 && p.price <= 2200.0 + 0.01, "{p:?}");
        }
    }

    #[tokio::test]
    async fn simulated_series_is_deterministic() {
        let provider = SimulatedSeriesProvider::new(today());
        let a = provider.fetch_series(Metal::Silver, 90, 7).await.unwrap();
        let b = provider.fetch_series(Metal::Silver, 90, 7).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn static_provider_parses_history_file() {
        let provider = StaticSeriesProvider::from_json_str(
            r#"{"gold": [
                {"date": "2026-01-01", "price": 2000.0},
                {"date": "2026-01-08", "price": 2010.0}
            ]}"#,
        )
        .unwrap();

        let gold = provider.fetch_series(Metal::Gold, 90, 7).await.unwrap();
        assert_eq!(gold.len(), 2);
        let silver = provider.fetch_series(Metal::Silver, 90, 7).await.unwrap();
        assert!(silver.is_empty());
    }

    #[test]
    fn history_file_rejects_bad_prices() {
        let res = StaticSeriesProvider::from_json_str(
            r#"{"gold": [{"date": "2026-01-01", "price": -1.0}]}"#,
        );
        assert!(res.is_err());
    }
}
