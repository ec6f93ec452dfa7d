use crate::domain::market::Metal;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str = "이 제안은 기술적 분석에 기반한 참고용이며, 투자 조언이 아닙니다. 투자 결정 시 전문가와 상담하시기 바랍니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalSignals {
    pub trend: TrendSignal,
    pub momentum: Momentum,
    pub volatility: VolatilityLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub metal: Metal,
    pub action: Action,
    /// Always within 0..=100.
    pub confidence: u8,
    /// In rule evaluation order.
    pub reasons: Vec<String>,
    pub technical_signals: TechnicalSignals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// `None` when the silver price is zero or not finite.
    pub gold_silver_ratio: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub gold: Recommendation,
    pub silver: Recommendation,
    pub market_context: MarketContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPair {
    pub gold: Recommendation,
    pub silver: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContextView {
    /// Two decimals, e.g. "84.21".
    pub gold_silver_ratio: Option<String>,
    pub timestamp: String,
}

/// Wire shape consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub recommendations: RecommendationPair,
    pub market_context: MarketContextView,
    pub disclaimer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<RecommendationBundle> for RecommendationsResponse {
    fn from(bundle: RecommendationBundle) -> Self {
        Self {
            recommendations: RecommendationPair {
                gold: bundle.gold,
                silver: bundle.silver,
            },
            market_context: MarketContextView {
                gold_silver_ratio: bundle
                    .market_context
                    .gold_silver_ratio
                    .map(|r| format!("{r:.2}")),
                timestamp: bundle
                    .market_context
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            disclaimer: DISCLAIMER.to_string(),
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn rec(metal: Metal) -> Recommendation {
        Recommendation {
            metal,
            action: Action::StrongBuy,
            confidence: 75,
            reasons: vec!["안전자산으로서의 가치 유지".to_string()],
            technical_signals: TechnicalSignals {
                trend: TrendSignal::Bullish,
                momentum: Momentum::Strong,
                volatility: VolatilityLevel::Low,
            },
        }
    }

    #[test]
    fn response_formats_ratio_and_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap();
        let bundle = RecommendationBundle {
            gold: rec(Metal::Gold),
            silver: rec(Metal::Silver),
            market_context: MarketContext {
                gold_silver_ratio: Some(84.2066),
                timestamp: ts,
            },
        };

        let v = serde_json::to_value(RecommendationsResponse::from(bundle)).unwrap();
        assert_eq!(v["marketContext"]["goldSilverRatio"], json!("84.21"));
        assert_eq!(v["marketContext"]["timestamp"], json!("2026-01-27T10:00:00.000Z"));
        assert_eq!(v["recommendations"]["gold"]["action"], json!("strong_buy"));
        assert_eq!(
            v["recommendations"]["silver"]["technicalSignals"]["volatility"],
            json!("low")
        );
        assert!(v.get("warning").is_none());
    }
}
