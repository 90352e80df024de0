pub mod perpetuity;
pub mod projection;
pub mod ratios;
pub mod wacc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Band around the intrinsic price inside which the market is "reasonable".
pub const FAIR_PRICE_BAND: Rate = dec!(0.20);

/// One percentage point, as a rate.
pub(crate) const ONE_POINT: Rate = dec!(0.01);

/// Percentages to rates.
pub(crate) fn pct_to_rate(pct: Decimal) -> Rate {
    pct / dec!(100)
}

/// Divide only when the denominator is non-zero.
pub(crate) fn checked_ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

// ---------------------------------------------------------------------------
// Market classification
// ---------------------------------------------------------------------------

/// Where the market price sits relative to a model's intrinsic price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketClassification {
    Undervalued,
    Reasonable,
    Overvalued,
}

impl std::fmt::Display for MarketClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketClassification::Undervalued => write!(f, "undervalued"),
            MarketClassification::Reasonable => write!(f, "reasonable"),
            MarketClassification::Overvalued => write!(f, "overvalued"),
        }
    }
}

/// Relative gap of the market price over an intrinsic price:
/// (market − intrinsic) / intrinsic. `None` when the intrinsic price is zero.
pub fn price_gap(market_price: Money, intrinsic_price: Money) -> Option<Rate> {
    checked_ratio(market_price.checked_sub(intrinsic_price)?, intrinsic_price)
}

/// Classify the market price against an intrinsic price with a ±20% band.
pub fn classify_against_market(
    market_price: Money,
    intrinsic_price: Money,
) -> Option<MarketClassification> {
    let diff = price_gap(market_price, intrinsic_price)?;
    Some(if diff < -FAIR_PRICE_BAND {
        MarketClassification::Undervalued
    } else if diff <= FAIR_PRICE_BAND {
        MarketClassification::Reasonable
    } else {
        MarketClassification::Overvalued
    })
}

// ---------------------------------------------------------------------------
// DCF shared pieces
// ---------------------------------------------------------------------------

/// Conditions that stop a DCF scenario (or the whole projection model)
/// from producing a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DcfError {
    /// g ≥ discount rate
    GrowthNotBelowDiscountRate,
    /// discount rate ≤ 0
    NonPositiveDiscountRate,
    /// share count ≤ 0
    NoShares,
    /// the valuation does not fit the decimal range
    ValueOutOfRange,
}

impl std::fmt::Display for DcfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DcfError::GrowthNotBelowDiscountRate => write!(f, "g ≥ WACC"),
            DcfError::NonPositiveDiscountRate => write!(f, "WACC ≤ 0"),
            DcfError::NoShares => write!(f, "cannot price, zero shares"),
            DcfError::ValueOutOfRange => write!(f, "valuation exceeds numeric range"),
        }
    }
}

impl std::error::Error for DcfError {}

/// Gordon growth value of a cash flow growing at `growth` forever:
/// CF × (1 + g) / (r − g).
///
/// `None` when the spread is not positive or the result overflows.
pub fn gordon_growth_value(cash_flow: Money, growth: Rate, discount_rate: Rate) -> Option<Money> {
    let spread = discount_rate.checked_sub(growth)?;
    if spread <= Decimal::ZERO {
        return None;
    }
    cash_flow
        .checked_mul(Decimal::ONE.checked_add(growth)?)?
        .checked_div(spread)
}

/// Equity bridge shared by both DCF models: (equity value, price per share).
pub(crate) fn equity_bridge(
    enterprise_value: Money,
    net_debt: Money,
    shares_outstanding: Decimal,
) -> Option<(Money, Money)> {
    let equity_value = enterprise_value.checked_sub(net_debt)?;
    let price = equity_value.checked_div(shares_outstanding)?;
    Some((equity_value, price))
}
