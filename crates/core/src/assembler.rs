use crate::analysis::{analyze, score, AnalysisError, AnalysisInput};
use crate::domain::market::{MarketDataSnapshot, Metal};
use crate::domain::recommendation::{MarketContext, Recommendation, RecommendationBundle};
use crate::ingest::provider::{HistoricalSeriesProvider, DEFAULT_STEP_DAYS, DEFAULT_WINDOW_DAYS};
use chrono::{DateTime, Utc};

/// Builds the per-metal recommendations for one evaluation cycle. Stateless;
/// a history failure for one metal only degrades that metal to short-term scoring.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationAssembler {
    pub window_days: u32,
    pub step_days: u32,
}

impl Default for RecommendationAssembler {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            step_days: DEFAULT_STEP_DAYS,
        }
    }
}

pub fn gold_silver_ratio(snapshot: &MarketDataSnapshot) -> Result<f64, AnalysisError> {
    let gold = snapshot.gold.price;
    let silver = snapshot.silver.price;
    let ratio = gold / silver;
    if silver == 0.0 || !silver.is_finite() || !ratio.is_finite() {
        return Err(AnalysisError::InvalidRatio { gold, silver });
    }
    Ok(ratio)
}

impl RecommendationAssembler {
    pub async fn assemble(
        &self,
        snapshot: &MarketDataSnapshot,
        history: &dyn HistoricalSeriesProvider,
        now: DateTime<Utc>,
    ) -> RecommendationBundle {
        let ratio = match gold_silver_ratio(snapshot) {
            Ok(r) => Some(r),
            Err(err) => {
                tracing::warn!(error = %err, "omitting gold/silver ratio");
                None
            }
        };

        let (gold, silver) = tokio::join!(
            self.recommend(Metal::Gold, snapshot, history, ratio),
            self.recommend(Metal::Silver, snapshot, history, ratio),
        );

        RecommendationBundle {
            gold,
            silver,
            market_context: MarketContext {
                gold_silver_ratio: ratio,
                timestamp: now,
            },
        }
    }

    async fn recommend(
        &self,
        metal: Metal,
        snapshot: &MarketDataSnapshot,
        history: &dyn HistoricalSeriesProvider,
        ratio: Option<f64>,
    ) -> Recommendation {
        let quote = snapshot.quote(metal);
        let input = self
            .analysis_input(metal, quote.price, history)
            .await
            .unwrap_or(AnalysisInput::ShortTerm {
                change_percent: quote.change_percent,
            });
        score(metal, quote.price, &input, ratio)
    }

    async fn analysis_input(
        &self,
        metal: Metal,
        current_price: f64,
        history: &dyn HistoricalSeriesProvider,
    ) -> Option<AnalysisInput> {
        let series = match history
            .fetch_series(metal, self.window_days, self.step_days)
            .await
        {
            Ok(series) => series,
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(
                    %metal,
                    provider = history.provider_name(),
                    %error,
                    "historical series unavailable; using short-term change"
                );
                return None;
            }
        };

        match analyze(&series, current_price) {
            Ok(analysis) => Some(AnalysisInput::Rich(analysis)),
            Err(err) => {
                tracing::warn!(
                    %metal,
                    error = %err,
                    "historical analysis failed; using short-term change"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{HistoricalDataPoint, HistoricalSeries, MetalQuote};
    use crate::domain::recommendation::Action;
    use crate::ingest::history::StaticSeriesProvider;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 27, 1, 0, 0).unwrap()
    }

    fn snapshot(gold: f64, gold_pct: f64, silver: f64, silver_pct: f64) -> MarketDataSnapshot {
        MarketDataSnapshot {
            gold: MetalQuote::new(Metal::Gold, gold, 0.0, gold_pct, now()),
            silver: MetalQuote::new(Metal::Silver, silver, 0.0, silver_pct, now()),
        }
    }

    fn weekly(prices: &[f64]) -> HistoricalSeries {
        let start = NaiveDate::from_ymd_opt(2025, 10, 28).unwrap();
        HistoricalSeries::new(
            prices
                .iter()
                .enumerate()
                .map(|(i, &price)| HistoricalDataPoint {
                    date: start + Duration::days(7 * i as i64),
                    price,
                })
                .collect(),
        )
        .unwrap()
    }

    /// Average 2000, range 1900..2100, strong downward trend, recent decline.
    fn falling_gold() -> HistoricalSeries {
        let mut prices = vec![2100.0; 6];
        prices.push(2000.0);
        prices.extend([1900.0; 6]);
        weekly(&prices)
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl HistoricalSeriesProvider for FailingProvider {
        fn provider_name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_series(
            &self,
            metal: Metal,
            _: u32,
            _: u32,
        ) -> anyhow::Result<HistoricalSeries> {
            match metal {
                Metal::Gold => Ok(falling_gold()),
                Metal::Silver => anyhow::bail!("upstream timeout"),
            }
        }
    }

    #[test]
    fn ratio_requires_positive_finite_silver() {
        let ratio = gold_silver_ratio(&snapshot(2000.0, 0.0, 25.0, 0.0)).unwrap();
        assert!((ratio - 80.0).abs() < 1e-12);
        assert!(matches!(
            gold_silver_ratio(&snapshot(2000.0, 0.0, 0.0, 0.0)),
            Err(AnalysisError::InvalidRatio { .. })
        ));
        assert!(gold_silver_ratio(&snapshot(2000.0, 0.0, f64::NAN, 0.0)).is_err());
    }

    #[tokio::test]
    async fn gold_below_average_in_downtrend_is_strong_buy() {
        let provider = StaticSeriesProvider::new().with_series(Metal::Gold, falling_gold());
        let bundle = RecommendationAssembler::default()
            .assemble(&snapshot(1950.0, 0.0, 25.0, 0.0), &provider, now())
            .await;

        assert_eq!(bundle.gold.action, Action::StrongBuy);
        assert!(bundle.gold.confidence >= 70);
        assert!(bundle.gold.reasons[0].contains("3개월 평균 대비 2.5% 낮음"));
        assert_eq!(bundle.market_context.gold_silver_ratio, Some(78.0));
        assert_eq!(bundle.market_context.timestamp, now());
    }

    #[tokio::test]
    async fn empty_history_falls_back_to_short_term_change() {
        let provider = StaticSeriesProvider::new();
        let bundle = RecommendationAssembler::default()
            .assemble(&snapshot(1950.0, -2.5, 20.0, 0.0), &provider, now())
            .await;

        // 50 + 15 sharp drop + 5 safe haven
        assert_eq!(bundle.gold.confidence, 70);
        assert_eq!(bundle.gold.action, Action::StrongBuy);
        // ratio 97.5 lifts silver: 50 + 15 + 5
        assert_eq!(bundle.silver.confidence, 70);
        assert_eq!(bundle.silver.reasons.len(), 2);
    }

    #[tokio::test]
    async fn one_failing_metal_does_not_affect_the_other() {
        let bundle = RecommendationAssembler::default()
            .assemble(&snapshot(1950.0, 0.0, 25.0, 3.5), &FailingProvider, now())
            .await;

        assert!(bundle.gold.reasons.len() >= 4);
        // short-term +3.5% -> -15, ratio 78 neutral, safe haven +5
        assert_eq!(bundle.silver.confidence, 40);
        assert_eq!(bundle.silver.action, Action::Sell);
    }

    #[tokio::test]
    async fn zero_silver_price_omits_ratio_rule() {
        let provider = StaticSeriesProvider::new();
        let bundle = RecommendationAssembler::default()
            .assemble(&snapshot(1950.0, 0.0, 0.0, 0.0), &provider, now())
            .await;

        assert_eq!(bundle.market_context.gold_silver_ratio, None);
        assert_eq!(bundle.silver.confidence, 55);
        assert_eq!(bundle.silver.reasons.len(), 1);
    }
}
