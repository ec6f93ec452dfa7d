pub mod error;
pub mod scoring;
pub mod series;

pub use error::AnalysisError;
pub use scoring::{score, AnalysisInput};
pub use series::{analyze, HistoricalAnalysis, Trend};
