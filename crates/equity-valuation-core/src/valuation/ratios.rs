use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::input::FinancialInput;
use crate::types::{Money, Multiple, Rate};

use super::checked_ratio;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

const PER_LOW: Multiple = dec!(15);
const PER_DEMANDING: Multiple = dec!(25);
const PER_WARNING: Multiple = dec!(30);

const EV_EBITDA_LOW: Multiple = dec!(8);
const EV_EBITDA_HIGH: Multiple = dec!(15);
const EV_EBITDA_WARNING: Multiple = dec!(25);

const EV_FCF_ATTRACTIVE: Multiple = dec!(15);
const EV_FCF_VERY_DEMANDING: Multiple = dec!(30);

const ROE_LOW: Rate = dec!(0.10);
const ROE_HIGH: Rate = dec!(0.15);

const MARGIN_LOW: Rate = dec!(0.15);
const MARGIN_HIGH: Rate = dec!(0.25);

/// Net debt / EBITDA above which leverage is considered high.
pub const HIGH_LEVERAGE: Multiple = dec!(3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Market multiples and returns. Every ratio is `None` when its
/// denominator is zero or a term falls outside the decimal range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub market_cap: Option<Money>,
    pub net_debt: Option<Money>,
    pub enterprise_value: Option<Money>,
    /// Market cap / net income
    pub per: Option<Multiple>,
    /// Market cap / revenue
    pub psr: Option<Multiple>,
    /// EBITDA / revenue
    pub ebitda_margin: Option<Rate>,
    pub ev_ebitda: Option<Multiple>,
    pub ev_fcf: Option<Multiple>,
    /// Net income / net equity
    pub roe: Option<Rate>,
    /// Net income / total assets
    pub roa: Option<Rate>,
    /// Net debt / EBITDA, as computed by the WACC estimator
    pub net_debt_to_ebitda: Option<Multiple>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerBand {
    Low,
    Reasonable,
    Demanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvEbitdaBand {
    Low,
    Reasonable,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvFcfBand {
    Attractive,
    Demanding,
    VeryDemanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoeBand {
    Low,
    Adequate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginBand {
    Low,
    Normal,
    High,
}

/// Qualitative bucket per ratio, present only when the ratio is defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioBands {
    pub per: Option<PerBand>,
    pub ev_ebitda: Option<EvEbitdaBand>,
    pub ev_fcf: Option<EvFcfBand>,
    pub roe: Option<RoeBand>,
    pub ebitda_margin: Option<MarginBand>,
}

/// Interpretation notes grouped by theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioNotes {
    pub profitability: Vec<String>,
    pub valuation: Vec<String>,
    pub solvency: Vec<String>,
    pub cash_flow_quality: Vec<String>,
}

/// Three-way verdict from the ratios alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreliminaryVerdict {
    Favorable,
    Neutral,
    Caution,
}

impl std::fmt::Display for PreliminaryVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreliminaryVerdict::Favorable => write!(f, "favorable"),
            PreliminaryVerdict::Neutral => write!(f, "neutral"),
            PreliminaryVerdict::Caution => write!(f, "caution"),
        }
    }
}

/// Output of the ratio engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioAnalysis {
    pub ratios: RatioSet,
    pub bands: RatioBands,
    pub notes: RatioNotes,
    pub warnings: Vec<String>,
    pub verdict: PreliminaryVerdict,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the ratio set, classify each ratio and derive a preliminary verdict.
///
/// `net_debt_to_ebitda` is the leverage already computed by the WACC
/// estimator; it is stored in the ratio set as-is.
pub fn analyze_ratios(
    input: &FinancialInput,
    net_debt_to_ebitda: Option<Multiple>,
) -> RatioAnalysis {
    let ratios = compute_ratios(input, net_debt_to_ebitda);

    let mut notes = RatioNotes::default();
    let mut warnings: Vec<String> = Vec::new();
    let mut bands = RatioBands::default();

    // --- Valuation ---
    if let Some(per) = ratios.per {
        let band = per_band(per);
        notes.valuation.push(match band {
            PerBand::Low => "PER low (<15).".into(),
            PerBand::Reasonable => "PER reasonable (15–25).".into(),
            PerBand::Demanding => "PER demanding (>25).".into(),
        });
        if per > PER_WARNING {
            warnings.push(format!("PER of {per:.2} above 30: possible overvaluation."));
        }
        bands.per = Some(band);
    }

    if let Some(ev_ebitda) = ratios.ev_ebitda {
        let band = ev_ebitda_band(ev_ebitda);
        notes.valuation.push(match band {
            EvEbitdaBand::Low => "EV/EBITDA low (<8).".into(),
            EvEbitdaBand::Reasonable => "EV/EBITDA reasonable (8–15).".into(),
            EvEbitdaBand::High => "EV/EBITDA high (>15).".into(),
        });
        if ev_ebitda > EV_EBITDA_WARNING {
            warnings.push(format!(
                "EV/EBITDA of {ev_ebitda:.2} above 25: demanding valuation."
            ));
        }
        bands.ev_ebitda = Some(band);
    }

    // --- Cash-flow quality ---
    if let Some(ev_fcf) = ratios.ev_fcf {
        let band = ev_fcf_band(ev_fcf);
        notes.cash_flow_quality.push(match band {
            EvFcfBand::Attractive => "EV/FCF attractive (<15).".into(),
            EvFcfBand::Demanding => "EV/FCF demanding (15–30).".into(),
            EvFcfBand::VeryDemanding => "EV/FCF very demanding (>30).".into(),
        });
        bands.ev_fcf = Some(band);
    }

    // --- Profitability ---
    if let Some(roe) = ratios.roe {
        let band = roe_band(roe);
        notes.profitability.push(match band {
            RoeBand::Low => "ROE low (<10%).".into(),
            RoeBand::Adequate => "ROE adequate (10–15%).".into(),
            RoeBand::High => "ROE high (>15%).".into(),
        });
        bands.roe = Some(band);
    }

    if let Some(margin) = ratios.ebitda_margin {
        let band = margin_band(margin);
        notes.profitability.push(match band {
            MarginBand::Low => "EBITDA margin low (<15%).".into(),
            MarginBand::Normal => "EBITDA margin normal (15–25%).".into(),
            MarginBand::High => "EBITDA margin high (>25%).".into(),
        });
        bands.ebitda_margin = Some(band);
    }

    let weak_cash_flow = input.free_cash_flow <= Decimal::ZERO;
    if weak_cash_flow {
        warnings.push("FCF ≤ 0: weak cash generation.".into());
        notes
            .cash_flow_quality
            .push("Weak or negative free cash flow.".into());
    }

    // --- Solvency ---
    let high_leverage = is_high_leverage(ratios.net_debt_to_ebitda);
    if high_leverage {
        warnings.push("Net debt/EBITDA above 3: high leverage.".into());
        notes.solvency.push("High leverage.".into());
    }

    let verdict = preliminary_verdict(&ratios, weak_cash_flow, high_leverage);

    RatioAnalysis {
        ratios,
        bands,
        notes,
        warnings,
        verdict,
    }
}

/// Raw ratios from the input; no interpretation.
pub fn compute_ratios(input: &FinancialInput, net_debt_to_ebitda: Option<Multiple>) -> RatioSet {
    let market_cap = input.market_cap();
    let net_debt = input.net_debt();
    let enterprise_value = input.enterprise_value();
    let over = |numerator: Option<Money>, denominator: Money| {
        numerator.and_then(|n| checked_ratio(n, denominator))
    };

    RatioSet {
        market_cap,
        net_debt,
        enterprise_value,
        per: over(market_cap, input.net_income),
        psr: over(market_cap, input.revenue),
        ebitda_margin: checked_ratio(input.ebitda, input.revenue),
        ev_ebitda: over(enterprise_value, input.ebitda),
        ev_fcf: over(enterprise_value, input.free_cash_flow),
        roe: checked_ratio(input.net_income, input.net_equity),
        roa: checked_ratio(input.net_income, input.total_assets),
        net_debt_to_ebitda,
    }
}

pub fn per_band(per: Multiple) -> PerBand {
    if per < PER_LOW {
        PerBand::Low
    } else if per <= PER_DEMANDING {
        PerBand::Reasonable
    } else {
        PerBand::Demanding
    }
}

pub fn ev_ebitda_band(ev_ebitda: Multiple) -> EvEbitdaBand {
    if ev_ebitda < EV_EBITDA_LOW {
        EvEbitdaBand::Low
    } else if ev_ebitda <= EV_EBITDA_HIGH {
        EvEbitdaBand::Reasonable
    } else {
        EvEbitdaBand::High
    }
}

pub fn ev_fcf_band(ev_fcf: Multiple) -> EvFcfBand {
    if ev_fcf < EV_FCF_ATTRACTIVE {
        EvFcfBand::Attractive
    } else if ev_fcf <= EV_FCF_VERY_DEMANDING {
        EvFcfBand::Demanding
    } else {
        EvFcfBand::VeryDemanding
    }
}

pub fn roe_band(roe: Rate) -> RoeBand {
    if roe < ROE_LOW {
        RoeBand::Low
    } else if roe <= ROE_HIGH {
        RoeBand::Adequate
    } else {
        RoeBand::High
    }
}

pub fn margin_band(margin: Rate) -> MarginBand {
    if margin < MARGIN_LOW {
        MarginBand::Low
    } else if margin <= MARGIN_HIGH {
        MarginBand::Normal
    } else {
        MarginBand::High
    }
}

pub fn is_high_leverage(net_debt_to_ebitda: Option<Multiple>) -> bool {
    net_debt_to_ebitda.is_some_and(|l| l > HIGH_LEVERAGE)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn preliminary_verdict(
    ratios: &RatioSet,
    weak_cash_flow: bool,
    high_leverage: bool,
) -> PreliminaryVerdict {
    // Undefined multiples never count as demanding.
    let demanding_valuation = ratios.per.is_some_and(|p| p > PER_DEMANDING)
        || ratios.ev_ebitda.is_some_and(|e| e > EV_EBITDA_HIGH);
    let healthy_profitability = ratios.roe.is_some_and(|r| r >= ROE_LOW);

    if !demanding_valuation && healthy_profitability && !high_leverage {
        PreliminaryVerdict::Favorable
    } else if demanding_valuation || high_leverage || weak_cash_flow {
        PreliminaryVerdict::Caution
    } else {
        PreliminaryVerdict::Neutral
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
