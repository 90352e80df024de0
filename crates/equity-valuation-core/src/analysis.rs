use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::input::{validate_financial_input, FinancialInput};
use crate::scoring::{score_investment, ScoreBreakdown};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::valuation::perpetuity::{value_perpetuity, PerpetuityDcf};
use crate::valuation::projection::{value_projection, ProjectionDcf};
use crate::valuation::ratios::{analyze_ratios, PreliminaryVerdict, RatioAnalysis};
use crate::valuation::wacc::{estimate_wacc, WaccEstimate};
use crate::EquityValuationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the projection DCF price compares with the perpetuity base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DcfComparison {
    ProjectionBelowPerpetuity,
    ProjectionAbovePerpetuity,
    Consistent,
}

impl DcfComparison {
    pub fn between(projection_price: Money, perpetuity_price: Money) -> Self {
        match projection_price.cmp(&perpetuity_price) {
            std::cmp::Ordering::Less => DcfComparison::ProjectionBelowPerpetuity,
            std::cmp::Ordering::Greater => DcfComparison::ProjectionAbovePerpetuity,
            std::cmp::Ordering::Equal => DcfComparison::Consistent,
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            DcfComparison::ProjectionBelowPerpetuity => {
                "The projection DCF values the share below the perpetuity DCF because growth is expected to decelerate."
            }
            DcfComparison::ProjectionAbovePerpetuity => {
                "The projection DCF values the share above the perpetuity DCF thanks to a more intensive early growth phase."
            }
            DcfComparison::Consistent => {
                "Both DCF models are consistent, with similar growth assumptions."
            }
        }
    }
}

/// Everything one analysis produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub wacc: WaccEstimate,
    pub ratios: RatioAnalysis,
    pub perpetuity_dcf: PerpetuityDcf,
    pub projection_dcf: ProjectionDcf,
    pub score: ScoreBreakdown,
    pub preliminary_verdict: PreliminaryVerdict,
    /// Absent when either DCF model has no price
    pub dcf_comparison: Option<DcfComparison>,
    pub dcf_comparison_note: Option<String>,
    /// Ratio, perpetuity DCF and projection DCF warnings, in that order
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full valuation pipeline.
///
/// Total and side-effect free: every component's failure is stored in its
/// own slot of the result.
pub fn run_analysis(input: &FinancialInput) -> AnalysisResult {
    let net_debt = input.net_debt();
    let wacc = estimate_wacc(&input.company_profile, net_debt, input.ebitda);

    let ratios = analyze_ratios(input, wacc.net_debt_to_ebitda);
    let perpetuity_dcf = value_perpetuity(input, wacc.wacc);
    let projection_dcf = value_projection(input, wacc.wacc);

    let score = score_investment(
        &ratios.ratios,
        input.free_cash_flow,
        input.share_price,
        perpetuity_dcf.base_price,
    );

    let dcf_comparison = match (projection_dcf.price_per_share(), perpetuity_dcf.base_price) {
        (Some(projection), Some(perpetuity)) => Some(DcfComparison::between(projection, perpetuity)),
        _ => None,
    };

    let warnings: Vec<String> = ratios
        .warnings
        .iter()
        .chain(&perpetuity_dcf.warnings)
        .chain(&projection_dcf.warnings)
        .cloned()
        .collect();

    AnalysisResult {
        preliminary_verdict: ratios.verdict,
        dcf_comparison_note: dcf_comparison.map(|c| c.note().to_string()),
        dcf_comparison,
        wacc,
        ratios,
        perpetuity_dcf,
        projection_dcf,
        score,
        warnings,
    }
}

/// Validate the input as a collector would, run the analysis and wrap it in
/// the standard output envelope.
pub fn analyze(input: &FinancialInput) -> EquityValuationResult<ComputationOutput<AnalysisResult>> {
    let start = Instant::now();

    validate_financial_input(input)?;

    let result = run_analysis(input);
    tracing::debug!(
        profile = %result.wacc.profile,
        wacc = %result.wacc.wacc,
        score = result.score.total,
        warnings = result.warnings.len(),
        "equity analysis complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let warnings = result.warnings.clone();

    Ok(with_metadata(
        "Ratios + automatic WACC + perpetuity DCF + 5-year projection DCF + investment score",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
