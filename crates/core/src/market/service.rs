use crate::domain::market::MarketDataSnapshot;
use crate::ingest::provider::MarketQuoteSource;
use crate::market::quotes::QuoteBook;
use crate::time::kst::{self, RefreshState};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const STALE_WARNING: &str = "Using cached data due to API error";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    #[serde(flatten)]
    pub snapshot: MarketDataSnapshot,
    /// When the snapshot was last fetched upstream, in KST.
    pub updated_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Default)]
struct MarketState {
    book: QuoteBook,
    snapshot: Option<MarketDataSnapshot>,
    refresh: Option<RefreshState>,
}

/// Serves the current market snapshot, refreshing upstream only in the
/// scheduled KST windows and falling back to the last good snapshot.
pub struct MarketDataService {
    source: Arc<dyn MarketQuoteSource>,
    state: tokio::sync::Mutex<MarketState>,
}

impl MarketDataService {
    pub fn new(source: Arc<dyn MarketQuoteSource>) -> Self {
        Self {
            source,
            state: tokio::sync::Mutex::new(MarketState::default()),
        }
    }

    pub async fn current(&self, now: DateTime<Utc>) -> Result<QuoteView> {
        let mut state = self.state.lock().await;

        let due = kst::should_refresh(now, state.refresh.as_ref());
        if let (false, Some(snapshot), Some(refresh)) =
            (due, state.snapshot.as_ref(), state.refresh.as_ref())
        {
            return Ok(view(snapshot, refresh, None));
        }

        match self.source.fetch_latest_prices().await {
            Ok(spot) => {
                let snapshot = state.book.apply(spot, now);
                let refresh = match state.refresh {
                    Some(prev) => prev.next(now),
                    None => RefreshState::first(now),
                };
                tracing::info!(
                    provider = self.source.provider_name(),
                    date = %refresh.last_refresh_date,
                    refreshes_today = refresh.refreshes_today,
                    gold = snapshot.gold.price,
                    silver = snapshot.silver.price,
                    "market quotes refreshed"
                );
                let out = view(&snapshot, &refresh, None);
                state.refresh = Some(refresh);
                state.snapshot = Some(snapshot);
                Ok(out)
            }
            Err(err) => match (state.snapshot.as_ref(), state.refresh.as_ref()) {
                (Some(snapshot), Some(refresh)) => {
                    let error = format!("{err:#}");
                    tracing::warn!(%error, "quote refresh failed; serving cached snapshot");
                    Ok(view(snapshot, refresh, Some(STALE_WARNING.to_string())))
                }
                _ => Err(err.context("no market data available")),
            },
        }
    }
}

fn view(
    snapshot: &MarketDataSnapshot,
    refresh: &RefreshState,
    warning: Option<String>,
) -> QuoteView {
    QuoteView {
        snapshot: snapshot.clone(),
        updated_at: refresh.last_refresh.with_timezone(&kst::kst()),
        warning,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::ingest::provider::MarketQuoteSource;
    use crate::ingest::types::SpotPrices;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Quote source returning scripted prices; `None` entries fail.
    pub struct ScriptedQuotes {
        script: Mutex<Vec<Option<(f64, f64)>>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedQuotes {
        pub fn new(script: Vec<Option<(f64, f64)>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MarketQuoteSource for ScriptedQuotes {
        fn provider_name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_latest_prices(&self) -> anyhow::Result<SpotPrices> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock();
            let next = if script.is_empty() { None } else { script.remove(0) };
            match next {
                Some((gold, silver)) => Ok(SpotPrices {
                    gold,
                    silver,
                    timestamp: Utc::now(),
                }),
                None => anyhow::bail!("scripted failure"),
            }
        }
    }
}
