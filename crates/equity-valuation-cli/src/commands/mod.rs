pub mod analysis;
pub mod valuation;
