use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;
use crate::valuation::price_gap;
use crate::valuation::ratios::RatioSet;
use crate::valuation::FAIR_PRICE_BAND;

pub const VALUATION_MAX: u32 = 40;
pub const PROFITABILITY_MAX: u32 = 25;
pub const FINANCIAL_RISK_MAX: u32 = 20;
pub const DCF_VS_MARKET_MAX: u32 = 15;
pub const TOTAL_MAX: u32 = 100;

/// Final recommendation derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Hold,
    Neutral,
    Avoid,
}

impl Recommendation {
    pub fn from_score(total: u32) -> Self {
        if total >= 75 {
            Recommendation::Buy
        } else if total >= 60 {
            Recommendation::Hold
        } else if total >= 45 {
            Recommendation::Neutral
        } else {
            Recommendation::Avoid
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "Buy"),
            Recommendation::Hold => write!(f, "Hold"),
            Recommendation::Neutral => write!(f, "Neutral"),
            Recommendation::Avoid => write!(f, "Avoid"),
        }
    }
}

/// Investment score split by block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// PER, EV/EBITDA and EV/FCF (max 40)
    pub valuation: u32,
    /// ROE and EBITDA margin (max 25)
    pub profitability: u32,
    /// Leverage and FCF sign (max 20)
    pub financial_risk: u32,
    /// Market price against the perpetuity DCF base price (max 15)
    pub dcf_vs_market: u32,
    /// Sum of the blocks, clamped to 0..=100
    pub total: u32,
    pub recommendation: Recommendation,
}

/// Score a company from its ratios, FCF and the perpetuity DCF base price.
///
/// Each block is a tiered lookup; an undefined input contributes nothing.
pub fn score_investment(
    ratios: &RatioSet,
    free_cash_flow: Money,
    market_price: Money,
    dcf_base_price: Option<Money>,
) -> ScoreBreakdown {
    let valuation = valuation_score(ratios);
    let profitability = profitability_score(ratios);
    let financial_risk = financial_risk_score(ratios, free_cash_flow);
    let dcf_vs_market = dcf_vs_market_score(market_price, dcf_base_price);

    let total = (valuation + profitability + financial_risk + dcf_vs_market).min(TOTAL_MAX);

    ScoreBreakdown {
        valuation,
        profitability,
        financial_risk,
        dcf_vs_market,
        total,
        recommendation: Recommendation::from_score(total),
    }
}

fn valuation_score(ratios: &RatioSet) -> u32 {
    let per = ratios.per.map_or(0, |per| tier_below(per, dec!(15), dec!(25), [14, 10, 4]));
    let ev_ebitda = ratios
        .ev_ebitda
        .map_or(0, |m| tier_below(m, dec!(8), dec!(15), [14, 10, 4]));
    let ev_fcf = ratios
        .ev_fcf
        .map_or(0, |m| tier_below(m, dec!(15), dec!(30), [12, 8, 2]));
    per + ev_ebitda + ev_fcf
}

fn profitability_score(ratios: &RatioSet) -> u32 {
    let roe = ratios.roe.map_or(0, |roe| {
        if roe > dec!(0.15) {
            13
        } else if roe >= dec!(0.10) {
            9
        } else {
            4
        }
    });
    let margin = ratios.ebitda_margin.map_or(0, |margin| {
        if margin > dec!(0.25) {
            12
        } else if margin >= dec!(0.15) {
            8
        } else {
            3
        }
    });
    roe + margin
}

fn financial_risk_score(ratios: &RatioSet, free_cash_flow: Money) -> u32 {
    let leverage = ratios.net_debt_to_ebitda.map_or(0, |l| {
        if l <= dec!(2) {
            12
        } else if l <= dec!(3) {
            8
        } else {
            3
        }
    });
    let cash_flow = if free_cash_flow > Decimal::ZERO { 8 } else { 2 };
    leverage + cash_flow
}

fn dcf_vs_market_score(market_price: Money, dcf_base_price: Option<Money>) -> u32 {
    match dcf_base_price.and_then(|base| price_gap(market_price, base)) {
        Some(diff) if diff < -FAIR_PRICE_BAND => 15,
        Some(diff) if diff <= FAIR_PRICE_BAND => 10,
        Some(_) => 4,
        None => 0,
    }
}

/// Points for a "lower is better" multiple: strictly below `low`, up to and
/// including `high`, or above.
fn tier_below(value: Decimal, low: Decimal, high: Decimal, points: [u32; 3]) -> u32 {
    if value < low {
        points[0]
    } else if value <= high {
        points[1]
    } else {
        points[2]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
