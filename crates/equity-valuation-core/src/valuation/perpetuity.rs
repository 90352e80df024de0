use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::input::FinancialInput;
use crate::types::{Money, Rate};

use super::{
    classify_against_market, equity_bridge, gordon_growth_value, pct_to_rate, DcfError,
    MarketClassification, ONE_POINT,
};

/// Floor for the optimistic discount rate (0.01%).
const MIN_DISCOUNT_RATE: Rate = dec!(0.0001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Conservative,
    Base,
    Optimistic,
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::Conservative => write!(f, "Conservative"),
            ScenarioKind::Base => write!(f, "Base"),
            ScenarioKind::Optimistic => write!(f, "Optimistic"),
        }
    }
}

/// Valuation produced by one Gordon-growth scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValuation {
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub price_per_share: Money,
}

/// One scenario: its assumptions and either a valuation or the reason it
/// could not be priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: ScenarioKind,
    pub growth_rate: Rate,
    pub discount_rate: Rate,
    pub outcome: Result<ScenarioValuation, DcfError>,
}

impl ScenarioResult {
    pub fn price_per_share(&self) -> Option<Money> {
        self.outcome.as_ref().ok().map(|v| v.price_per_share)
    }
}

/// Output of the perpetuity-growth DCF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerpetuityDcf {
    /// Conservative, Base, Optimistic, in that order
    pub scenarios: Vec<ScenarioResult>,
    /// Price per share of the Base scenario
    pub base_price: Option<Money>,
    /// Market price against the Base scenario price
    pub market_classification: Option<MarketClassification>,
    pub warnings: Vec<String>,
}

impl PerpetuityDcf {
    pub fn scenario(&self, kind: ScenarioKind) -> Option<&ScenarioResult> {
        self.scenarios.iter().find(|s| s.scenario == kind)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the company under three perpetuity-growth scenarios.
///
/// Conservative discounts at WACC + 1pp, Base at WACC and Optimistic at
/// WACC − 1pp (floored at 0.01%). A failing scenario never stops the others.
pub fn value_perpetuity(input: &FinancialInput, wacc: Rate) -> PerpetuityDcf {
    let mut warnings: Vec<String> = Vec::new();

    let scenarios: Vec<ScenarioResult> = scenario_assumptions(input, wacc)
        .into_iter()
        .map(|(scenario, growth_rate, discount_rate)| ScenarioResult {
            scenario,
            growth_rate,
            discount_rate,
            outcome: value_scenario(input, growth_rate, discount_rate),
        })
        .collect();

    let base_price = scenarios
        .iter()
        .find(|s| s.scenario == ScenarioKind::Base)
        .and_then(ScenarioResult::price_per_share);

    let market_classification =
        base_price.and_then(|price| classify_against_market(input.share_price, price));

    if input.free_cash_flow <= Decimal::ZERO {
        warnings.push("FCF ≤ 0: perpetuity DCF may be unreliable.".into());
    }

    PerpetuityDcf {
        scenarios,
        base_price,
        market_classification,
        warnings,
    }
}

/// (scenario, growth, discount rate) for each of the three scenarios.
pub fn scenario_assumptions(input: &FinancialInput, wacc: Rate) -> [(ScenarioKind, Rate, Rate); 3] {
    [
        (
            ScenarioKind::Conservative,
            pct_to_rate(input.conservative_growth_pct),
            wacc.saturating_add(ONE_POINT),
        ),
        (ScenarioKind::Base, pct_to_rate(input.base_growth_pct), wacc),
        (
            ScenarioKind::Optimistic,
            pct_to_rate(input.optimistic_growth_pct),
            wacc.saturating_sub(ONE_POINT).max(MIN_DISCOUNT_RATE),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn value_scenario(
    input: &FinancialInput,
    growth: Rate,
    discount_rate: Rate,
) -> Result<ScenarioValuation, DcfError> {
    if growth >= discount_rate {
        return Err(DcfError::GrowthNotBelowDiscountRate);
    }
    if discount_rate <= Decimal::ZERO {
        return Err(DcfError::NonPositiveDiscountRate);
    }
    if input.shares_outstanding <= Decimal::ZERO {
        return Err(DcfError::NoShares);
    }

    let enterprise_value = gordon_growth_value(input.free_cash_flow, growth, discount_rate)
        .ok_or(DcfError::ValueOutOfRange)?;
    let net_debt = input.net_debt().ok_or(DcfError::ValueOutOfRange)?;
    let (equity_value, price_per_share) =
        equity_bridge(enterprise_value, net_debt, input.shares_outstanding)
            .ok_or(DcfError::ValueOutOfRange)?;

    Ok(ScenarioValuation {
        enterprise_value,
        equity_value,
        price_per_share,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_input() -> FinancialInput {
        FinancialInput::default()
    }

    #[test]
    fn test_base_scenario_reference_values() {
        // FCF 120, g 2%, WACC 8%, net debt 200, 100 shares
        let out = value_perpetuity(&sample_input(), dec!(0.08));
        let base = out.scenario(ScenarioKind::Base).unwrap();
        let v = base.outcome.as_ref().unwrap();

        assert_eq!(v.enterprise_value, dec!(2040));
        assert_eq!(v.equity_value, dec!(1840));
        assert_eq!(v.price_per_share, dec!(18.40));
        assert_eq!(out.base_price, Some(dec!(18.40)));
    }

    #[test]
    fn test_scenario_discount_rates() {
        let out = value_perpetuity(&sample_input(), dec!(0.08));
        let rates: Vec<(ScenarioKind, Rate, Rate)> = out
            .scenarios
            .iter()
            .map(|s| (s.scenario, s.growth_rate, s.discount_rate))
            .collect();
        assert_eq!(
            rates,
            vec![
                (ScenarioKind::Conservative, dec!(0.015), dec!(0.09)),
                (ScenarioKind::Base, dec!(0.02), dec!(0.08)),
                (ScenarioKind::Optimistic, dec!(0.025), dec!(0.07)),
            ]
        );
    }

    #[test]
    fn test_optimistic_discount_rate_floor() {
        let out = value_perpetuity(&sample_input(), dec!(0.005));
        let opt = out.scenario(ScenarioKind::Optimistic).unwrap();
        assert_eq!(opt.discount_rate, dec!(0.0001));
    }

    #[test]
    fn test_market_classification() {
        // market 20 vs base 18.40: diff = +8.7% -> reasonable
        let out = value_perpetuity(&sample_input(), dec!(0.08));
        assert_eq!(
            out.market_classification,
            Some(MarketClassification::Reasonable)
        );

        let cheap = FinancialInput {
            share_price: dec!(10),
            ..sample_input()
        };
        let out = value_perpetuity(&cheap, dec!(0.08));
        assert_eq!(
            out.market_classification,
            Some(MarketClassification::Undervalued)
        );
    }

    #[test]
    fn test_growth_at_or_above_discount_fails_only_that_scenario() {
        let input = FinancialInput {
            optimistic_growth_pct: dec!(7),
            ..sample_input()
        };
        // optimistic discount = 7% -> g == r
        let out = value_perpetuity(&input, dec!(0.08));
        let opt = out.scenario(ScenarioKind::Optimistic).unwrap();
        assert_eq!(opt.outcome, Err(DcfError::GrowthNotBelowDiscountRate));
        assert_eq!(opt.price_per_share(), None);
        assert!(out.scenario(ScenarioKind::Base).unwrap().outcome.is_ok());
        assert!(out
            .scenario(ScenarioKind::Conservative)
            .unwrap()
            .outcome
            .is_ok());
    }

    #[test]
    fn test_failed_base_leaves_price_and_classification_undefined() {
        let input = FinancialInput {
            base_growth_pct: dec!(9),
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(0.08));
        assert_eq!(out.base_price, None);
        assert_eq!(out.market_classification, None);
    }

    #[test]
    fn test_zero_shares_fails_every_scenario() {
        let input = FinancialInput {
            shares_outstanding: Decimal::ZERO,
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(0.08));
        for s in &out.scenarios {
            assert_eq!(s.outcome, Err(DcfError::NoShares));
        }
        assert_eq!(out.base_price, None);
    }

    #[test]
    fn test_growth_check_precedes_share_check() {
        let input = FinancialInput {
            shares_outstanding: Decimal::ZERO,
            base_growth_pct: dec!(10),
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(0.08));
        assert_eq!(
            out.scenario(ScenarioKind::Base).unwrap().outcome,
            Err(DcfError::GrowthNotBelowDiscountRate)
        );
    }

    #[test]
    fn test_negative_wacc_fails_base_as_non_positive_rate() {
        // base g -2% < r -1%, so the rate check is what fails
        let input = FinancialInput {
            base_growth_pct: dec!(-2),
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(-0.01));
        let base = out.scenario(ScenarioKind::Base).unwrap();
        assert_eq!(base.outcome, Err(DcfError::NonPositiveDiscountRate));
        assert_eq!(out.base_price, None);
        assert_eq!(out.market_classification, None);
        // conservative r = 0% is not above g = 1.5%
        assert_eq!(
            out.scenario(ScenarioKind::Conservative).unwrap().outcome,
            Err(DcfError::GrowthNotBelowDiscountRate)
        );
    }

    #[test]
    fn test_extreme_wacc_saturates_scenario_rates() {
        let out = value_perpetuity(&sample_input(), Decimal::MAX);
        let cons = out.scenario(ScenarioKind::Conservative).unwrap();
        assert_eq!(cons.discount_rate, Decimal::MAX);
        assert!(out.base_price.is_some());

        let out = value_perpetuity(&sample_input(), Decimal::MIN);
        let opt = out.scenario(ScenarioKind::Optimistic).unwrap();
        assert_eq!(opt.discount_rate, dec!(0.0001));
        assert_eq!(
            out.scenario(ScenarioKind::Base).unwrap().outcome,
            Err(DcfError::GrowthNotBelowDiscountRate)
        );
    }

    #[test]
    fn test_out_of_range_net_debt_is_reported() {
        let input = FinancialInput {
            total_debt: Decimal::MAX,
            cash: -Decimal::MAX,
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(0.08));
        for s in &out.scenarios {
            assert_eq!(s.outcome, Err(DcfError::ValueOutOfRange));
        }
    }

    #[test]
    fn test_non_positive_fcf_warning() {
        let input = FinancialInput {
            free_cash_flow: dec!(-50),
            ..sample_input()
        };
        let out = value_perpetuity(&input, dec!(0.08));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("unreliable"));
        // still priced, just negative
        assert!(out.base_price.unwrap() < Decimal::ZERO);
    }

    #[test]
    fn test_gordon_round_trip() {
        let out = value_perpetuity(&sample_input(), dec!(0.08));
        let base = out.scenario(ScenarioKind::Base).unwrap();
        let ev = base.outcome.as_ref().unwrap().enterprise_value;
        let again =
            gordon_growth_value(sample_input().free_cash_flow, base.growth_rate, base.discount_rate);
        assert_eq!(again, Some(ev));
    }
}
