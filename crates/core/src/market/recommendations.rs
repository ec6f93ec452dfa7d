use crate::assembler::RecommendationAssembler;
use crate::cache::{TimedCache, RECOMMENDATION_TTL_MINUTES};
use crate::domain::recommendation::RecommendationsResponse;
use crate::ingest::history::SimulatedSeriesProvider;
use crate::ingest::provider::HistoricalSeriesProvider;
use crate::market::service::{MarketDataService, STALE_WARNING};
use crate::time::kst;
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;

/// Where price history comes from.
#[derive(Clone)]
pub enum HistorySource {
    Provider(Arc<dyn HistoricalSeriesProvider>),
    /// Demo series anchored on each cycle's quotes.
    Simulated,
}

/// Cached recommendation endpoint: reuses the last response for 5 minutes
/// within the same KST day, otherwise assembles a fresh one.
pub struct RecommendationService {
    market: Arc<MarketDataService>,
    history: HistorySource,
    assembler: RecommendationAssembler,
    cache: TimedCache<NaiveDate, RecommendationsResponse>,
}

impl RecommendationService {
    pub fn new(market: Arc<MarketDataService>, history: HistorySource) -> Self {
        Self {
            market,
            history,
            assembler: RecommendationAssembler::default(),
            cache: TimedCache::new(Duration::minutes(RECOMMENDATION_TTL_MINUTES)),
        }
    }

    pub async fn recommendations(&self, now: DateTime<Utc>) -> Result<RecommendationsResponse> {
        let today = kst::kst_date(now);
        if let Some(cached) = self.cache.fresh(&today, now) {
            return Ok(cached);
        }

        let view = match self.market.current(now).await {
            Ok(view) => view,
            Err(err) => {
                let Some(mut stale) = self.cache.last() else {
                    return Err(err);
                };
                let error = format!("{err:#}");
                tracing::warn!(%error, "market data unavailable; serving cached recommendations");
                stale.warning = Some(STALE_WARNING.to_string());
                return Ok(stale);
            }
        };

        let bundle = match &self.history {
            HistorySource::Provider(provider) => {
                self.assembler
                    .assemble(&view.snapshot, provider.as_ref(), now)
                    .await
            }
            HistorySource::Simulated => {
                let provider = SimulatedSeriesProvider::anchored(&view.snapshot, today);
                self.assembler.assemble(&view.snapshot, &provider, now).await
            }
        };

        let mut response = RecommendationsResponse::from(bundle);
        response.warning = view.warning;

        tracing::info!(
            gold_action = ?response.recommendations.gold.action,
            gold_confidence = response.recommendations.gold.confidence,
            silver_action = ?response.recommendations.silver.action,
            silver_confidence = response.recommendations.silver.confidence,
            "recommendations assembled"
        );

        self.cache.store(today, response.clone(), now);
        Ok(response)
    }
}
