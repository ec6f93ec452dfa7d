use crate::analysis::series::{HistoricalAnalysis, Trend};
use crate::domain::market::Metal;
use crate::domain::recommendation::{
    Action, Momentum, Recommendation, TechnicalSignals, TrendSignal, VolatilityLevel,
};

const BASELINE_SCORE: i32 = 50;
const SAFE_HAVEN_BONUS: i32 = 5;
const SAFE_HAVEN_REASON: &str = "안전자산으로서의 가치 유지";

// Trend strength above which an up/down trend counts as strong.
const STRONG_TREND: f64 = 0.01;

const RATIO_SILVER_CHEAP: f64 = 85.0;
const RATIO_SILVER_RICH: f64 = 70.0;

/// What the engine knows about an asset's recent behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput {
    /// A full historical analysis is available.
    Rich(HistoricalAnalysis),
    /// Only the short-term (day-over-day) move is known.
    ShortTerm { change_percent: f64 },
}

/// Accumulates score adjustments and their reasons in evaluation order.
#[derive(Debug)]
struct Scorecard {
    score: i32,
    reasons: Vec<String>,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            score: BASELINE_SCORE,
            reasons: Vec::new(),
        }
    }

    fn add(&mut self, delta: i32, reason: String) {
        self.score += delta;
        self.reasons.push(reason);
    }
}

/// Deterministic buy/sell heuristic. Same inputs always give the same output.
pub fn score(
    metal: Metal,
    current_price: f64,
    input: &AnalysisInput,
    cross_asset_ratio: Option<f64>,
) -> Recommendation {
    let mut card = Scorecard::new();

    match input {
        AnalysisInput::Rich(analysis) => score_history(&mut card, metal, current_price, analysis),
        AnalysisInput::ShortTerm { change_percent } => score_short_term(&mut card, *change_percent),
    }

    if metal == Metal::Silver {
        if let Some(ratio) = cross_asset_ratio.filter(|r| r.is_finite() && *r > 0.0) {
            score_gold_silver_ratio(&mut card, ratio);
        }
    }

    card.add(SAFE_HAVEN_BONUS, SAFE_HAVEN_REASON.to_string());

    let confidence = card.score.clamp(0, 100) as u8;
    let (action, trend, momentum) = classify(confidence);

    Recommendation {
        metal,
        action,
        confidence,
        reasons: card.reasons,
        technical_signals: TechnicalSignals {
            trend,
            momentum,
            volatility: volatility_level(input),
        },
    }
}

fn score_history(card: &mut Scorecard, metal: Metal, price: f64, a: &HistoricalAnalysis) {
    let name = metal.display_name();

    // Deviation from the 3-month average.
    let deviation = if a.average_price == 0.0 {
        0.0
    } else {
        (price - a.average_price) / a.average_price * 100.0
    };
    if deviation < -5.0 {
        card.add(
            20,
            format!(
                "{name} 현재가가 3개월 평균(${:.2}) 대비 {:.1}% 저평가 - 매수 기회",
                a.average_price,
                deviation.abs()
            ),
        );
    } else if deviation < -2.0 {
        card.add(
            10,
            format!(
                "{name} 현재가가 3개월 평균 대비 {:.1}% 낮음 - 매수 고려",
                deviation.abs()
            ),
        );
    } else if deviation > 5.0 {
        card.add(
            -20,
            format!(
                "{name} 현재가가 3개월 평균(${:.2}) 대비 {deviation:.1}% 고평가 - 매수 신중",
                a.average_price
            ),
        );
    } else if deviation > 2.0 {
        card.add(
            -10,
            format!("{name} 현재가가 3개월 평균 대비 {deviation:.1}% 높음 - 신중한 접근"),
        );
    }

    // Position within the 3-month range.
    if a.position_in_range < 0.2 {
        card.add(
            15,
            format!(
                "{name} 가격이 3개월 최저가(${:.2}) 근처 - 매수 타이밍 유리",
                a.min_price
            ),
        );
    } else if a.position_in_range > 0.8 {
        card.add(
            -15,
            format!(
                "{name} 가격이 3개월 최고가(${:.2}) 근처 - 고점 부담",
                a.max_price
            ),
        );
    }

    let strong = a.trend_strength > STRONG_TREND;
    let (delta, reason) = match (a.trend, strong) {
        (Trend::Upward, true) => (-10, "3개월간 강한 상승 추세 지속 - 고점 매수 주의"),
        (Trend::Upward, false) => (-5, "3개월간 상승 추세 - 신중한 접근 권장"),
        (Trend::Downward, true) => (15, "3개월간 하락 추세 - 매수 기회 모색"),
        (Trend::Downward, false) => (10, "3개월간 약한 하락 추세 - 매수 고려"),
        (Trend::Sideways, _) => (5, "3개월간 횡보 추세 - 안정적 가격 흐름"),
    };
    card.add(delta, reason.to_string());

    // Last 30 days; a decline raises the score.
    let recent = a.recent_change;
    if recent < -3.0 {
        card.add(12, format!("최근 30일 {:.1}% 하락 - 반등 기대", recent.abs()));
    } else if recent < -1.0 {
        card.add(
            6,
            format!("최근 30일 {:.1}% 하락 - 매수 타이밍 접근", recent.abs()),
        );
    } else if recent > 3.0 {
        card.add(-12, format!("최근 30일 {recent:.1}% 상승 - 조정 가능성"));
    } else if recent > 1.0 {
        card.add(-6, format!("최근 30일 {recent:.1}% 상승 - 신중한 접근"));
    }

    let vol = a.volatility_percent();
    if vol > 5.0 {
        card.add(-5, format!("높은 변동성 ({vol:.1}%) - 리스크 관리 필요"));
    } else if vol < 2.0 {
        card.add(5, format!("낮은 변동성 ({vol:.1}%) - 안정적 투자 환경"));
    }
}

fn score_short_term(card: &mut Scorecard, change_percent: f64) {
    if change_percent > 2.0 {
        card.add(
            -15,
            format!("단기 급등 ({change_percent:.2}%) - 조정 가능성"),
        );
    } else if change_percent > 0.5 {
        card.add(-5, "상승 추세 - 신중한 접근 권장".to_string());
    } else if change_percent < -2.0 {
        card.add(
            15,
            format!("단기 급락 ({:.2}%) - 매수 기회", change_percent.abs()),
        );
    } else if change_percent < -0.5 {
        card.add(5, "하락 추세 - 매수 타이밍 접근".to_string());
    }
}

fn score_gold_silver_ratio(card: &mut Scorecard, ratio: f64) {
    if ratio > RATIO_SILVER_CHEAP {
        card.add(
            15,
            format!("금/은 비율 높음 ({ratio:.1}) - 은이 상대적으로 저평가"),
        );
    } else if ratio < RATIO_SILVER_RICH {
        card.add(
            -10,
            format!("금/은 비율 낮음 ({ratio:.1}) - 은이 상대적으로 고평가"),
        );
    }
}

fn classify(confidence: u8) -> (Action, TrendSignal, Momentum) {
    match confidence {
        70..=u8::MAX => (Action::StrongBuy, TrendSignal::Bullish, Momentum::Strong),
        55..=69 => (Action::Buy, TrendSignal::Bullish, Momentum::Moderate),
        45..=54 => (Action::Hold, TrendSignal::Neutral, Momentum::Weak),
        30..=44 => (Action::Sell, TrendSignal::Bearish, Momentum::Moderate),
        _ => (Action::StrongSell, TrendSignal::Bearish, Momentum::Strong),
    }
}

fn volatility_level(input: &AnalysisInput) -> VolatilityLevel {
    let (pct, high, medium) = match input {
        AnalysisInput::Rich(a) => (a.volatility_percent(), 5.0, 2.0),
        AnalysisInput::ShortTerm { change_percent } => (change_percent.abs(), 3.0, 1.0),
    };
    if pct > high {
        VolatilityLevel::High
    } else if pct > medium {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    }
}
