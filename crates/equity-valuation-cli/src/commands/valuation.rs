use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use equity_valuation_core::analysis::DcfComparison;
use equity_valuation_core::scoring::{score_investment, ScoreBreakdown};
use equity_valuation_core::types::{with_metadata, Money, Rate};
use equity_valuation_core::valuation::perpetuity::{value_perpetuity, PerpetuityDcf};
use equity_valuation_core::valuation::projection::{value_projection, ProjectionDcf};
use equity_valuation_core::valuation::ratios::{analyze_ratios, PreliminaryVerdict};
use equity_valuation_core::valuation::wacc::estimate_wacc;

use super::analysis::FinancialArgs;

/// Arguments for the DCF valuations
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    #[command(flatten)]
    pub financial: FinancialArgs,

    /// Discount rate as a decimal (e.g. 0.085); skips the WACC estimate
    #[arg(long)]
    pub wacc: Option<Decimal>,
}

/// Both DCF models under one discount rate.
#[derive(Debug, Serialize)]
struct DcfReport {
    wacc: Rate,
    wacc_overridden: bool,
    perpetuity: PerpetuityDcf,
    projection: ProjectionDcf,
    dcf_comparison: Option<DcfComparison>,
    dcf_comparison_note: Option<String>,
}

/// Score together with the inputs it was derived from.
#[derive(Debug, Serialize)]
struct ScoreReport {
    total: u32,
    recommendation: String,
    breakdown: ScoreBreakdown,
    wacc: Rate,
    dcf_base_price: Option<Money>,
    preliminary_verdict: PreliminaryVerdict,
}

pub fn run_wacc(args: FinancialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = args.load()?;

    let estimate = estimate_wacc(&input.company_profile, input.net_debt(), input.ebitda);
    tracing::info!(profile = %estimate.profile, wacc = %estimate.wacc, "estimated WACC");

    let output = with_metadata(
        "Profile base rate plus net debt/EBITDA leverage surcharge",
        &input,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        estimate,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_ratios(args: FinancialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = args.load()?;

    let leverage = estimate_wacc(&input.company_profile, input.net_debt(), input.ebitda)
        .net_debt_to_ebitda;
    let ratios = analyze_ratios(&input, leverage);
    let warnings = ratios.warnings.clone();

    let output = with_metadata(
        "Market multiples, returns and interpretation bands",
        &input,
        warnings,
        start.elapsed().as_micros() as u64,
        ratios,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = args.financial.load()?;

    let (wacc, wacc_overridden) = match args.wacc {
        Some(rate) => (rate, true),
        None => (
            estimate_wacc(&input.company_profile, input.net_debt(), input.ebitda).wacc,
            false,
        ),
    };
    tracing::info!(%wacc, wacc_overridden, "running DCF models");

    let perpetuity = value_perpetuity(&input, wacc);
    let projection = value_projection(&input, wacc);
    let dcf_comparison = match (projection.price_per_share(), perpetuity.base_price) {
        (Some(p), Some(b)) => Some(DcfComparison::between(p, b)),
        _ => None,
    };

    let warnings: Vec<String> = perpetuity
        .warnings
        .iter()
        .chain(&projection.warnings)
        .cloned()
        .collect();

    let report = DcfReport {
        wacc,
        wacc_overridden,
        perpetuity,
        projection,
        dcf_comparison_note: dcf_comparison.map(|c| c.note().to_string()),
        dcf_comparison,
    };

    let output = with_metadata(
        "Perpetuity-growth DCF (3 scenarios) and 5-year projection DCF",
        &input,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_score(args: FinancialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = args.load()?;

    let estimate = estimate_wacc(&input.company_profile, input.net_debt(), input.ebitda);
    let ratios = analyze_ratios(&input, estimate.net_debt_to_ebitda);
    let perpetuity = value_perpetuity(&input, estimate.wacc);
    let breakdown = score_investment(
        &ratios.ratios,
        input.free_cash_flow,
        input.share_price,
        perpetuity.base_price,
    );
    tracing::info!(total = breakdown.total, "scored investment");

    let warnings: Vec<String> = ratios
        .warnings
        .iter()
        .chain(&perpetuity.warnings)
        .cloned()
        .collect();

    let report = ScoreReport {
        total: breakdown.total,
        recommendation: breakdown.recommendation.to_string(),
        breakdown,
        wacc: estimate.wacc,
        dcf_base_price: perpetuity.base_price,
        preliminary_verdict: ratios.verdict,
    };

    let output = with_metadata(
        "Weighted 0-100 score: valuation, profitability, financial risk, DCF vs market",
        &input,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}
