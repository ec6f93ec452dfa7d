use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The historical series has no points.
    EmptySeries,
    /// Silver price is zero or not finite, so the gold/silver ratio is undefined.
    InvalidRatio { gold: f64, silver: f64 },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptySeries => write!(f, "no historical data available"),
            AnalysisError::InvalidRatio { gold, silver } => write!(
                f,
                "gold/silver ratio is undefined (gold={gold}, silver={silver})"
            ),
        }
    }
}

impl std::error::Error for AnalysisError {}
