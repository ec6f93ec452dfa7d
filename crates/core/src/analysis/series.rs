use crate::analysis::error::AnalysisError;
use crate::domain::market::HistoricalSeries;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Slope threshold, relative to the average price, separating a trend from sideways drift.
const TREND_SLOPE_THRESHOLD: f64 = 0.001;
const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Upward,
    Downward,
    Sideways,
}

/// Descriptive statistics over a historical window. Recomputed every
/// evaluation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAnalysis {
    pub current_price: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price_range: f64,
    pub price_range_percent: f64,
    pub trend: Trend,
    /// |slope| / average, never negative.
    pub trend_strength: f64,
    /// Population standard deviation of the window's prices.
    pub volatility: f64,
    /// Percent change of the trailing 30-day average vs the 30 days before it.
    pub recent_change: f64,
    /// 0 at the window minimum, 1 at the maximum; 0 when the range is flat.
    pub position_in_range: f64,
}

impl HistoricalAnalysis {
    pub fn volatility_percent(&self) -> f64 {
        ratio_percent(self.volatility, self.average_price)
    }
}

pub fn analyze(
    series: &HistoricalSeries,
    current_price: f64,
) -> Result<HistoricalAnalysis, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let prices = series.prices();
    let n = prices.len() as f64;

    let average_price = prices.iter().sum::<f64>() / n;
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let price_range = max_price - min_price;
    let price_range_percent = ratio_percent(price_range, average_price);

    let slope = regression_slope(&prices);
    let trend = if slope > average_price * TREND_SLOPE_THRESHOLD {
        Trend::Upward
    } else if slope < -average_price * TREND_SLOPE_THRESHOLD {
        Trend::Downward
    } else {
        Trend::Sideways
    };
    let trend_strength = if average_price == 0.0 {
        0.0
    } else {
        slope.abs() / average_price
    };

    let variance = prices
        .iter()
        .map(|p| (p - average_price).powi(2))
        .sum::<f64>()
        / n;
    let volatility = variance.sqrt();

    let recent_change = recent_change(series, average_price);

    let position_in_range = if price_range > 0.0 {
        ((current_price - min_price) / price_range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(HistoricalAnalysis {
        current_price,
        average_price,
        min_price,
        max_price,
        price_range,
        price_range_percent,
        trend,
        trend_strength,
        volatility,
        recent_change,
        position_in_range,
    })
}

/// Least-squares slope of price against sample index 0..n-1.
fn regression_slope(prices: &[f64]) -> f64 {
    let n = prices.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = prices.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        },
    );

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}

/// Windows are anchored on the last sample's date: the recent window holds
/// samples within 30 days of it, the previous window the 30 days before that.
/// For weekly samples that is the last 5 points vs the 4 before them.
fn recent_change(series: &HistoricalSeries, average_price: f64) -> f64 {
    let points = series.points();
    let Some(last) = points.last() else {
        return 0.0;
    };

    let recent_start = last.date - Duration::days(RECENT_WINDOW_DAYS);
    let previous_start = recent_start - Duration::days(RECENT_WINDOW_DAYS);

    let recent = mean(
        points
            .iter()
            .filter(|p| p.date > recent_start)
            .map(|p| p.price),
    );
    let previous = mean(
        points
            .iter()
            .filter(|p| p.date > previous_start && p.date <= recent_start)
            .map(|p| p.price),
    );

    let recent_avg = recent.unwrap_or(average_price);
    let previous_avg = previous.unwrap_or(average_price);
    ratio_percent(recent_avg - previous_avg, previous_avg)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}
