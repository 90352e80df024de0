use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::input::CompanyProfile;
use crate::types::{Money, Multiple, Rate};

use super::checked_ratio;

/// Leverage above which the heavy surcharge applies.
const VERY_HIGH_LEVERAGE: Multiple = dec!(4);
/// Leverage above which the light surcharge applies.
const HIGH_LEVERAGE: Multiple = dec!(3);

const VERY_HIGH_LEVERAGE_SURCHARGE: Rate = dec!(0.02);
const HIGH_LEVERAGE_SURCHARGE: Rate = dec!(0.01);

/// Output of the automatic WACC estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccEstimate {
    /// Final discount rate after the leverage adjustment
    pub wacc: Rate,
    /// Base rate for the resolved profile
    pub base_rate: Rate,
    /// Surcharge added for leverage (zero when none applied)
    pub leverage_surcharge: Rate,
    /// Profile actually used
    pub profile: CompanyProfile,
    /// True when the supplied label was not recognised
    pub profile_fallback: bool,
    /// Net debt / EBITDA, undefined when EBITDA is zero
    pub net_debt_to_ebitda: Option<Multiple>,
    /// Every decision taken, in order
    pub justification: Vec<String>,
}

/// Base discount rate for a company profile.
pub fn base_rate(profile: CompanyProfile) -> Rate {
    match profile {
        CompanyProfile::Growth => dec!(0.10),
        CompanyProfile::Mature => dec!(0.08),
        CompanyProfile::Defensive => dec!(0.07),
        CompanyProfile::Cyclical => dec!(0.09),
    }
}

/// Estimate WACC from the company profile and its leverage.
///
/// Base rate by profile, then +2pp when net debt / EBITDA > 4x or +1pp when
/// it is > 3x. With zero EBITDA, or a net debt outside the decimal range,
/// leverage is undefined and no surcharge is applied; the justification
/// says so.
pub fn estimate_wacc(profile_label: &str, net_debt: Option<Money>, ebitda: Money) -> WaccEstimate {
    let mut justification: Vec<String> = Vec::new();

    let (profile, profile_fallback) = CompanyProfile::resolve(profile_label);
    if profile_fallback {
        justification.push(format!(
            "Unrecognised company profile '{}'; using '{profile}' instead.",
            profile_label.trim()
        ));
    }

    let base = base_rate(profile);
    justification.push(format!(
        "Base WACC for {profile}: {:.2}%",
        base * dec!(100)
    ));

    let net_debt_to_ebitda = net_debt.and_then(|nd| checked_ratio(nd, ebitda));
    let leverage_surcharge = match net_debt_to_ebitda {
        Some(leverage) if leverage > VERY_HIGH_LEVERAGE => {
            justification.push(format!(
                "WACC raised by 2pp: very high leverage (net debt/EBITDA {:.2}x > 4x).",
                leverage
            ));
            VERY_HIGH_LEVERAGE_SURCHARGE
        }
        Some(leverage) if leverage > HIGH_LEVERAGE => {
            justification.push(format!(
                "WACC raised by 1pp: high leverage (net debt/EBITDA {:.2}x > 3x).",
                leverage
            ));
            HIGH_LEVERAGE_SURCHARGE
        }
        Some(leverage) => {
            justification.push(format!(
                "No leverage adjustment: net debt/EBITDA {:.2}x ≤ 3x.",
                leverage
            ));
            Decimal::ZERO
        }
        None if ebitda.is_zero() => {
            justification.push(
                "No leverage adjustment: EBITDA is 0, net debt/EBITDA is undefined.".into(),
            );
            Decimal::ZERO
        }
        None => {
            justification.push(
                "No leverage adjustment: net debt/EBITDA exceeds the numeric range.".into(),
            );
            Decimal::ZERO
        }
    };

    WaccEstimate {
        wacc: base + leverage_surcharge,
        base_rate: base,
        leverage_surcharge,
        profile,
        profile_fallback,
        net_debt_to_ebitda,
        justification,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mature_low_leverage_no_surcharge() {
        // debt 300, cash 100 -> net debt 200; EBITDA 200 -> 1.0x
        let est = estimate_wacc("madura", Some(dec!(200)), dec!(200));
        assert_eq!(est.net_debt_to_ebitda, Some(dec!(1)));
        assert_eq!(est.leverage_surcharge, Decimal::ZERO);
        assert_eq!(est.wacc, dec!(0.08));
        assert!(!est.profile_fallback);
    }

    #[test]
    fn test_leverage_exactly_four_gets_light_surcharge() {
        // debt 900, cash 100 -> net debt 800; EBITDA 200 -> 4.0x
        let est = estimate_wacc("madura", Some(dec!(800)), dec!(200));
        assert_eq!(est.net_debt_to_ebitda, Some(dec!(4)));
        assert_eq!(est.wacc, dec!(0.09));
    }

    #[test]
    fn test_leverage_above_four_gets_heavy_surcharge() {
        let est = estimate_wacc("growth", Some(dec!(1000)), dec!(200));
        assert_eq!(est.wacc, dec!(0.12));
        assert!(est.justification.iter().any(|j| j.contains("2pp")));
    }

    #[test]
    fn test_leverage_exactly_three_no_surcharge() {
        let est = estimate_wacc("defensiva", Some(dec!(600)), dec!(200));
        assert_eq!(est.wacc, dec!(0.07));
        assert!(est.justification.iter().any(|j| j.contains("≤ 3x")));
    }

    #[test]
    fn test_zero_ebitda_documents_missing_leverage() {
        let est = estimate_wacc("cíclica", Some(dec!(500)), Decimal::ZERO);
        assert_eq!(est.net_debt_to_ebitda, None);
        assert_eq!(est.leverage_surcharge, Decimal::ZERO);
        assert_eq!(est.wacc, dec!(0.09));
        assert!(est
            .justification
            .iter()
            .any(|j| j.contains("EBITDA is 0")));
    }

    #[test]
    fn test_unknown_profile_falls_back_with_note() {
        let est = estimate_wacc("startup", Some(dec!(0)), dec!(100));
        assert_eq!(est.profile, CompanyProfile::Mature);
        assert!(est.profile_fallback);
        assert_eq!(est.wacc, dec!(0.08));
        assert!(est.justification[0].contains("startup"));
    }

    #[test]
    fn test_profile_label_case_insensitive() {
        let est = estimate_wacc("GROWTH", Some(dec!(0)), dec!(100));
        assert_eq!(est.profile, CompanyProfile::Growth);
        assert_eq!(est.wacc, dec!(0.10));
    }

    #[test]
    fn test_negative_leverage_no_surcharge() {
        // net cash position
        let est = estimate_wacc("madura", Some(dec!(-300)), dec!(100));
        assert_eq!(est.net_debt_to_ebitda, Some(dec!(-3)));
        assert_eq!(est.wacc, dec!(0.08));
    }

    #[test]
    fn test_justification_order() {
        let est = estimate_wacc("madura", Some(dec!(700)), dec!(200));
        assert_eq!(est.justification.len(), 2);
        assert!(est.justification[0].starts_with("Base WACC for madura: 8.00%"));
        assert!(est.justification[1].contains("1pp"));
    }

    #[test]
    fn test_out_of_range_leverage_documented() {
        let est = estimate_wacc("madura", None, dec!(200));
        assert_eq!(est.net_debt_to_ebitda, None);
        assert_eq!(est.wacc, dec!(0.08));
        assert!(est.justification[1].contains("numeric range"));

        let est = estimate_wacc("madura", Some(Decimal::MAX), dec!(0.0001));
        assert_eq!(est.net_debt_to_ebitda, None);
        assert!(est.justification[1].contains("numeric range"));
    }

    #[test]
    fn test_wacc_always_positive() {
        for profile in CompanyProfile::ALL {
            let est = estimate_wacc(profile.label(), Some(dec!(-1000)), dec!(-1));
            assert!(est.wacc > Decimal::ZERO);
        }
    }
}
