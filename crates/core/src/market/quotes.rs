use crate::domain::market::{MarketDataSnapshot, Metal, MetalQuote};
use crate::ingest::types::SpotPrices;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReferencePrices {
    gold: f64,
    silver: f64,
    recorded_at: DateTime<Utc>,
}

/// Turns raw spot prices into quotes with a day-over-day change. The
/// reference pair is replaced at most once every 24 hours.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    reference: Option<ReferencePrices>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, spot: SpotPrices, now: DateTime<Utc>) -> MarketDataSnapshot {
        let (gold_ref, silver_ref) = match self.reference {
            Some(r) => (Some(r.gold), Some(r.silver)),
            None => (None, None),
        };

        let snapshot = MarketDataSnapshot {
            gold: quote(Metal::Gold, spot.gold, gold_ref, spot.timestamp),
            silver: quote(Metal::Silver, spot.silver, silver_ref, spot.timestamp),
        };

        let expired = self
            .reference
            .map_or(true, |r| now - r.recorded_at > Duration::hours(24));
        if expired {
            self.reference = Some(ReferencePrices {
                gold: spot.gold,
                silver: spot.silver,
                recorded_at: now,
            });
        }

        snapshot
    }
}

fn quote(metal: Metal, price: f64, reference: Option<f64>, timestamp: DateTime<Utc>) -> MetalQuote {
    let (change, change_percent) = match reference {
        Some(prev) if prev != 0.0 => (price - prev, (price - prev) / prev * 100.0),
        Some(prev) => (price - prev, 0.0),
        None => (0.0, 0.0),
    };
    MetalQuote::new(metal, price, change, change_percent, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spot(gold: f64, silver: f64, at: DateTime<Utc>) -> SpotPrices {
        SpotPrices {
            gold,
            silver,
            timestamp: at,
        }
    }

    #[test]
    fn first_quote_has_no_change() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let mut book = QuoteBook::new();
        let s = book.apply(spot(2000.0, 25.0, t0), t0);
        assert_eq!(s.gold.change, 0.0);
        assert_eq!(s.silver.change_percent, 0.0);
        assert_eq!(s.gold.symbol, "XAU/USD");
    }

    #[test]
    fn change_is_measured_against_reference_until_it_expires() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let mut book = QuoteBook::new();
        book.apply(spot(2000.0, 25.0, t0), t0);

        let t1 = t0 + Duration::hours(12);
        let s = book.apply(spot(2050.0, 24.5, t1), t1);
        assert_eq!(s.gold.change, 50.0);
        assert!((s.gold.change_percent - 2.5).abs() < 1e-12);
        assert!((s.silver.change_percent - -2.0).abs() < 1e-12);

        // Still within 24h: reference stays at the first quote.
        let t2 = t0 + Duration::hours(20);
        let s = book.apply(spot(2100.0, 25.0, t2), t2);
        assert_eq!(s.gold.change, 100.0);

        // After 24h the change is computed first, then the reference rolls.
        let t3 = t0 + Duration::hours(25);
        let s = book.apply(spot(2020.0, 25.0, t3), t3);
        assert_eq!(s.gold.change, 20.0);
        let t4 = t3 + Duration::hours(1);
        let s = book.apply(spot(2030.0, 25.0, t4), t4);
        assert_eq!(s.gold.change, 10.0);
    }
}
