use anyhow::ensure;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
}

impl Metal {
    /// Korean display name used in reason strings.
    pub fn display_name(self) -> &'static str {
        match self {
            Metal::Gold => "금",
            Metal::Silver => "은",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Metal::Gold => "XAU/USD",
            Metal::Silver => "XAG/USD",
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metal::Gold => f.write_str("gold"),
            Metal::Silver => f.write_str("silver"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetalQuote {
    pub fn new(
        metal: Metal,
        price: f64,
        change: f64,
        change_percent: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: metal.symbol().to_string(),
            price,
            change,
            change_percent,
            timestamp,
        }
    }
}

/// Current quotes for both metals, read once per evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
    pub gold: MetalQuote,
    pub silver: MetalQuote,
}

impl MarketDataSnapshot {
    pub fn quote(&self, metal: Metal) -> &MetalQuote {
        match metal {
            Metal::Gold => &self.gold,
            Metal::Silver => &self.silver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Price samples ordered ascending by date. Dates are unique and prices are
/// positive and finite. May be empty; the analyzer rejects empty series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoricalSeries {
    points: Vec<HistoricalDataPoint>,
}

impl HistoricalSeries {
    pub fn new(points: Vec<HistoricalDataPoint>) -> anyhow::Result<Self> {
        for p in &points {
            ensure!(
                p.price.is_finite() && p.price > 0.0,
                "price must be positive and finite (date={}, price={})",
                p.date,
                p.price
            );
        }
        for pair in points.windows(2) {
            ensure!(
                pair[0].date < pair[1].date,
                "series dates must be strictly ascending ({} then {})",
                pair[0].date,
                pair[1].date
            );
        }
        Ok(Self { points })
    }

    /// Sorts by date and keeps the last sample for duplicated dates before validating.
    pub fn from_unsorted(mut points: Vec<HistoricalDataPoint>) -> anyhow::Result<Self> {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<HistoricalDataPoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        Self::new(deduped)
    }

    pub fn points(&self) -> &[HistoricalDataPoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<'de> Deserialize<'de> for HistoricalSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<HistoricalDataPoint>::deserialize(deserializer)?;
        HistoricalSeries::from_unsorted(points).map_err(serde::de::Error::custom)
    }
}
