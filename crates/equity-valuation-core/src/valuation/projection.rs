use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::input::FinancialInput;
use crate::types::{Money, Percent, Rate};

use super::{
    classify_against_market, equity_bridge, gordon_growth_value, pct_to_rate, DcfError,
    MarketClassification,
};

/// Number of explicit forecast years.
pub const FORECAST_YEARS: u32 = 5;

const EXTREME_GROWTH_PCT: Percent = dec!(40);
const HIGH_GROWTH_PCT: Percent = dec!(30);
const TERMINAL_WEIGHT_LIMIT: Rate = dec!(0.70);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One explicit forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    /// Growth applied this year, in percent
    pub growth_pct: Percent,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Valuation produced by the five-year projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionValuation {
    /// g1..g5 in percent
    pub growth_schedule_pct: Vec<Percent>,
    pub years: Vec<ProjectionYear>,
    /// Terminal value at the end of year 5
    pub terminal_value: Money,
    /// Terminal value discounted to today
    pub pv_terminal_value: Money,
    /// PV(terminal value) / EV, zero when EV is zero
    pub terminal_weight: Rate,
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub price_per_share: Money,
    pub market_classification: Option<MarketClassification>,
}

/// Output of the projection DCF: a valuation or the fatal condition that
/// stopped it, plus the warnings gathered either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDcf {
    pub outcome: Result<ProjectionValuation, DcfError>,
    pub warnings: Vec<String>,
}

impl ProjectionDcf {
    pub fn price_per_share(&self) -> Option<Money> {
        self.outcome.as_ref().ok().map(|v| v.price_per_share)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Linearly decaying growth path from `initial_pct` to `terminal_pct`.
///
/// g_t = initial × (5 − t)/5 + terminal × t/5, which is the same line as
/// initial − t × (initial − terminal)/5 but cannot overflow for any pair of
/// inputs. The fifth year is exactly the terminal rate.
pub fn growth_schedule(initial_pct: Percent, terminal_pct: Percent) -> Vec<Percent> {
    let years = Decimal::from(FORECAST_YEARS);
    let initial_part = initial_pct / years;
    let terminal_part = terminal_pct / years;
    (1..=FORECAST_YEARS)
        .map(|t| {
            if t == FORECAST_YEARS {
                return terminal_pct;
            }
            (initial_part * Decimal::from(FORECAST_YEARS - t))
                .saturating_add(terminal_part * Decimal::from(t))
        })
        .collect()
}

/// Five explicit years of FCF growth plus a Gordon terminal value, all
/// discounted at WACC.
pub fn value_projection(input: &FinancialInput, wacc: Rate) -> ProjectionDcf {
    let mut warnings: Vec<String> = Vec::new();
    let fcf0 = input.free_cash_flow;
    let terminal_growth = pct_to_rate(input.terminal_growth_pct);

    if fcf0 <= Decimal::ZERO {
        warnings.push("FCF0 ≤ 0: the projection may be unreliable.".into());
    }

    let schedule = growth_schedule(input.initial_growth_pct, input.terminal_growth_pct);
    if schedule.iter().any(|g| *g > EXTREME_GROWTH_PCT) {
        warnings.push("Some projected growth rate is extremely high (>40%).".into());
    } else if schedule.iter().any(|g| *g > HIGH_GROWTH_PCT) {
        warnings.push("Some projected growth rate is very high (>30%).".into());
    }

    // --- Fatal conditions ---
    let fatal = if terminal_growth >= wacc {
        Some(DcfError::GrowthNotBelowDiscountRate)
    } else if wacc <= Decimal::ZERO {
        Some(DcfError::NonPositiveDiscountRate)
    } else if input.shares_outstanding <= Decimal::ZERO {
        Some(DcfError::NoShares)
    } else {
        None
    };
    if let Some(err) = fatal {
        return ProjectionDcf {
            outcome: Err(err),
            warnings,
        };
    }

    let outcome = project(input, wacc, terminal_growth, schedule, &mut warnings);
    ProjectionDcf { outcome, warnings }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn project(
    input: &FinancialInput,
    wacc: Rate,
    terminal_growth: Rate,
    schedule: Vec<Percent>,
    warnings: &mut Vec<String>,
) -> Result<ProjectionValuation, DcfError> {
    let one_plus_wacc = Decimal::ONE
        .checked_add(wacc)
        .ok_or(DcfError::ValueOutOfRange)?;

    let mut years: Vec<ProjectionYear> = Vec::with_capacity(schedule.len());
    let mut fcf = input.free_cash_flow;
    for (idx, growth_pct) in schedule.iter().enumerate() {
        let year = idx as u32 + 1;
        fcf = Decimal::ONE
            .checked_add(pct_to_rate(*growth_pct))
            .and_then(|factor| fcf.checked_mul(factor))
            .ok_or(DcfError::ValueOutOfRange)?;
        let discount_factor = discount_factor(one_plus_wacc, year)?;
        let present_value = fcf
            .checked_mul(discount_factor)
            .ok_or(DcfError::ValueOutOfRange)?;
        years.push(ProjectionYear {
            year,
            growth_pct: *growth_pct,
            fcf,
            discount_factor,
            present_value,
        });
    }

    let terminal_value =
        gordon_growth_value(fcf, terminal_growth, wacc).ok_or(DcfError::ValueOutOfRange)?;
    let pv_terminal_value = terminal_value
        .checked_mul(discount_factor(one_plus_wacc, FORECAST_YEARS)?)
        .ok_or(DcfError::ValueOutOfRange)?;

    let enterprise_value = years
        .iter()
        .try_fold(pv_terminal_value, |acc, y| acc.checked_add(y.present_value))
        .ok_or(DcfError::ValueOutOfRange)?;

    let terminal_weight = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_terminal_value
            .checked_div(enterprise_value)
            .ok_or(DcfError::ValueOutOfRange)?
    };
    if terminal_weight > TERMINAL_WEIGHT_LIMIT {
        warnings.push(format!(
            "Terminal value is {:.1}% of enterprise value (>70%).",
            terminal_weight.saturating_mul(dec!(100))
        ));
    }

    let net_debt = input.net_debt().ok_or(DcfError::ValueOutOfRange)?;
    let (equity_value, price_per_share) =
        equity_bridge(enterprise_value, net_debt, input.shares_outstanding)
            .ok_or(DcfError::ValueOutOfRange)?;
    let market_classification = classify_against_market(input.share_price, price_per_share);

    Ok(ProjectionValuation {
        growth_schedule_pct: schedule,
        years,
        terminal_value,
        pv_terminal_value,
        terminal_weight,
        enterprise_value,
        equity_value,
        price_per_share,
        market_classification,
    })
}

/// 1 / (1 + wacc)^year
fn discount_factor(one_plus_wacc: Decimal, year: u32) -> Result<Rate, DcfError> {
    one_plus_wacc
        .checked_powi(i64::from(year))
        .and_then(|growth| Decimal::ONE.checked_div(growth))
        .ok_or(DcfError::ValueOutOfRange)
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
    fn test_growth_schedule_linear() {
        let g = growth_schedule(dec!(10), dec!(2));
        assert_eq!(g, vec![dec!(8.4), dec!(6.8), dec!(5.2), dec!(3.6), dec!(2.0)]);
    }

    #[test]
    fn test_growth_schedule_ends_exactly_on_terminal() {
        for (initial, terminal) in [
            (dec!(12.3), dec!(2.7)),
            (dec!(25), dec!(-1.5)),
            (dec!(3), dec!(3)),
            (dec!(7.77), dec!(0.01)),
        ] {
            let g = growth_schedule(initial, terminal);
            assert_eq!(g[4], terminal, "g5 for {initial} -> {terminal}");
            assert!(g.windows(2).all(|w| w[0] >= w[1]), "non-increasing");
        }
    }

    #[test]
    fn test_basic_projection() {
        let out = value_projection(&sample_input(), dec!(0.08));
        let v = out.outcome.as_ref().unwrap();

        assert_eq!(v.years.len(), 5);
        // Year 1 FCF = 120 * 1.084
        assert_eq!(v.years[0].fcf, dec!(130.08));
        assert_eq!(v.growth_schedule_pct[4], dec!(2.0));

        // EV = sum PV + PV(TV)
        let pv_sum: Decimal = v.years.iter().map(|y| y.present_value).sum();
        assert_eq!(v.enterprise_value, pv_sum + v.pv_terminal_value);
        assert_eq!(v.equity_value, v.enterprise_value - dec!(200));
        assert_eq!(v.price_per_share, v.equity_value / dec!(100));

        // TV from the last year's FCF
        let last = v.years[4].fcf;
        let expected_tv = last * dec!(1.02) / dec!(0.06);
        assert!((v.terminal_value - expected_tv).abs() < dec!(0.000001));
    }

    #[test]
    fn test_projection_beats_perpetuity_with_early_growth() {
        // With 10% -> 2% growth the projection price exceeds the flat 2% Gordon price (18.40)
        let out = value_projection(&sample_input(), dec!(0.08));
        assert!(out.price_per_share().unwrap() > dec!(18.40));
    }

    #[test]
    fn test_discount_factors_decline() {
        let out = value_projection(&sample_input(), dec!(0.08));
        let v = out.outcome.unwrap();
        assert!(v.years.windows(2).all(|w| w[0].discount_factor > w[1].discount_factor));
        let df1 = v.years[0].discount_factor;
        assert!((df1 - Decimal::ONE / dec!(1.08)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_terminal_weight_warning() {
        let out = value_projection(&sample_input(), dec!(0.08));
        let v = out.outcome.as_ref().unwrap();
        assert!(v.terminal_weight > dec!(0.70));
        assert!(out.warnings.iter().any(|w| w.contains(">70%")));
    }

    #[test]
    fn test_terminal_growth_not_below_wacc_is_fatal() {
        let input = FinancialInput {
            terminal_growth_pct: dec!(8),
            ..sample_input()
        };
        let out = value_projection(&input, dec!(0.08));
        assert_eq!(out.outcome, Err(DcfError::GrowthNotBelowDiscountRate));
        assert_eq!(out.price_per_share(), None);
    }

    #[test]
    fn test_non_positive_wacc_is_fatal() {
        // terminal -1% < 0% passes the growth check, then the rate check fails
        let input = FinancialInput {
            terminal_growth_pct: dec!(-1),
            ..sample_input()
        };
        let out = value_projection(&input, Decimal::ZERO);
        assert_eq!(out.outcome, Err(DcfError::NonPositiveDiscountRate));
        assert_eq!(out.price_per_share(), None);
    }

    #[test]
    fn test_zero_enterprise_value_has_zero_terminal_weight() {
        let input = FinancialInput {
            free_cash_flow: Decimal::ZERO,
            ..sample_input()
        };
        let out = value_projection(&input, dec!(0.08));
        let v = out.outcome.as_ref().unwrap();
        assert_eq!(v.enterprise_value, Decimal::ZERO);
        assert_eq!(v.terminal_weight, Decimal::ZERO);
        assert_eq!(v.price_per_share, dec!(-2));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("FCF0"));
    }

    #[test]
    fn test_fcf_growth_overflow_is_out_of_range() {
        let input = FinancialInput {
            free_cash_flow: Decimal::MAX,
            ..sample_input()
        };
        let out = value_projection(&input, dec!(0.08));
        assert_eq!(out.outcome, Err(DcfError::ValueOutOfRange));
    }

    #[test]
    fn test_huge_wacc_is_out_of_range() {
        // (1 + 1e10)^3 already exceeds the decimal range
        let out = value_projection(&sample_input(), dec!(10000000000));
        assert_eq!(out.outcome, Err(DcfError::ValueOutOfRange));

        let out = value_projection(&sample_input(), Decimal::MAX);
        assert_eq!(out.outcome, Err(DcfError::ValueOutOfRange));
    }

    #[test]
    fn test_growth_schedule_extreme_inputs() {
        let g = growth_schedule(Decimal::MAX, Decimal::MAX);
        assert_eq!(g[4], Decimal::MAX);
        let g = growth_schedule(Decimal::MAX, Decimal::MIN);
        assert_eq!(g.len(), 5);
        assert_eq!(g[4], Decimal::MIN);
    }

    #[test]
    fn test_zero_shares_is_fatal_but_keeps_warnings() {
        let input = FinancialInput {
            shares_outstanding: Decimal::ZERO,
            free_cash_flow: Decimal::ZERO,
            initial_growth_pct: dec!(60),
            ..sample_input()
        };
        let out = value_projection(&input, dec!(0.08));
        assert_eq!(out.outcome, Err(DcfError::NoShares));
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].starts_with("FCF0"));
        assert!(out.warnings[1].contains(">40%"));
    }

    #[test]
    fn test_high_growth_warning_only_when_not_extreme() {
        let input = FinancialInput {
            initial_growth_pct: dec!(40),
            ..sample_input()
        };
        // g1 = 40 - 7.6 = 32.4 -> high but not extreme
        let out = value_projection(&input, dec!(0.08));
        assert!(out.warnings.iter().any(|w| w.contains(">30%")));
        assert!(!out.warnings.iter().any(|w| w.contains(">40%")));
    }

    #[test]
    fn test_market_classification_uses_projection_price() {
        let out = value_projection(&sample_input(), dec!(0.08));
        let v = out.outcome.unwrap();
        assert_eq!(
            v.market_classification,
            classify_against_market(dec!(20), v.price_per_share)
        );
    }
}
