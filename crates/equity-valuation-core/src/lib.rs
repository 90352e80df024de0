pub mod analysis;
pub mod error;
pub mod input;
pub mod scoring;
pub mod types;
pub mod valuation;

pub use analysis::{analyze, run_analysis, AnalysisResult};
pub use error::EquityValuationError;
pub use input::{CompanyProfile, FinancialInput};
pub use types::*;

/// Standard result type for all equity-valuation operations
pub type EquityValuationResult<T> = Result<T, EquityValuationError>;
