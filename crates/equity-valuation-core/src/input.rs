use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityValuationError;
use crate::types::{Money, Percent};
use crate::EquityValuationResult;

// ---------------------------------------------------------------------------
// Company profile
// ---------------------------------------------------------------------------

/// Company profile used to pick a base discount rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyProfile {
    #[serde(rename = "growth")]
    Growth,
    #[default]
    #[serde(rename = "madura")]
    Mature,
    #[serde(rename = "defensiva")]
    Defensive,
    #[serde(rename = "cíclica")]
    Cyclical,
}

impl CompanyProfile {
    pub const ALL: [CompanyProfile; 4] = [
        CompanyProfile::Growth,
        CompanyProfile::Mature,
        CompanyProfile::Defensive,
        CompanyProfile::Cyclical,
    ];

    /// Canonical label as accepted on input.
    pub fn label(&self) -> &'static str {
        match self {
            CompanyProfile::Growth => "growth",
            CompanyProfile::Mature => "madura",
            CompanyProfile::Defensive => "defensiva",
            CompanyProfile::Cyclical => "cíclica",
        }
    }

    /// Case-insensitive lookup of a profile label.
    pub fn parse(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.label() == wanted)
    }

    /// Resolve a label, falling back to the default profile.
    ///
    /// The flag is `true` when the fallback was taken so the caller can
    /// document the substitution.
    pub fn resolve(label: &str) -> (Self, bool) {
        match Self::parse(label) {
            Some(profile) => (profile, false),
            None => (Self::default(), true),
        }
    }
}

impl std::fmt::Display for CompanyProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Financial input
// ---------------------------------------------------------------------------

/// Flat record of everything one analysis needs.
///
/// Growth assumptions are percentages (2.0 = 2%), everything else is in the
/// reporting currency or a raw count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInput {
    /// Profile label (`growth`, `madura`, `defensiva`, `cíclica`)
    pub company_profile: String,
    pub revenue: Money,
    pub ebitda: Money,
    pub free_cash_flow: Money,
    pub total_debt: Money,
    pub cash: Money,
    pub share_price: Money,
    pub shares_outstanding: Decimal,
    /// Book value of equity
    pub net_equity: Money,
    pub total_assets: Money,
    pub net_income: Money,
    pub conservative_growth_pct: Percent,
    pub base_growth_pct: Percent,
    pub optimistic_growth_pct: Percent,
    /// First-year growth of the explicit projection
    pub initial_growth_pct: Percent,
    /// Growth reached in year 5 and used for the terminal value
    pub terminal_growth_pct: Percent,
}

impl Default for FinancialInput {
    fn default() -> Self {
        FinancialInput {
            company_profile: CompanyProfile::Mature.label().to_string(),
            revenue: dec!(1000),
            ebitda: dec!(200),
            free_cash_flow: dec!(120),
            total_debt: dec!(300),
            cash: dec!(100),
            share_price: dec!(20),
            shares_outstanding: dec!(100),
            net_equity: dec!(500),
            total_assets: dec!(1500),
            net_income: dec!(80),
            conservative_growth_pct: dec!(1.5),
            base_growth_pct: dec!(2.0),
            optimistic_growth_pct: dec!(2.5),
            initial_growth_pct: dec!(10.0),
            terminal_growth_pct: dec!(2.0),
        }
    }
}

impl FinancialInput {
    /// Net debt = total debt − cash. `None` outside the decimal range.
    pub fn net_debt(&self) -> Option<Money> {
        self.total_debt.checked_sub(self.cash)
    }

    /// Market capitalisation = share price × shares outstanding.
    /// `None` outside the decimal range.
    pub fn market_cap(&self) -> Option<Money> {
        self.share_price.checked_mul(self.shares_outstanding)
    }

    /// Enterprise value = market cap + net debt
    pub fn enterprise_value(&self) -> Option<Money> {
        self.market_cap()?.checked_add(self.net_debt()?)
    }

    pub fn from_json(contents: &str) -> EquityValuationResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_yaml(contents: &str) -> EquityValuationResult<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Guards applied by input collectors before running an analysis.
///
/// The engine itself never calls this: it stays total and reports invalid
/// combinations through its own error markers.
pub fn validate_financial_input(input: &FinancialInput) -> EquityValuationResult<()> {
    let mut errors: Vec<EquityValuationError> = Vec::new();

    if input.shares_outstanding <= Decimal::ZERO {
        errors.push(EquityValuationError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Share count must be greater than 0".into(),
        });
    }
    if input.share_price <= Decimal::ZERO {
        errors.push(EquityValuationError::InvalidInput {
            field: "share_price".into(),
            reason: "Share price must be greater than 0".into(),
        });
    }
    if input.terminal_growth_pct > input.initial_growth_pct {
        errors.push(EquityValuationError::InvalidInput {
            field: "terminal_growth_pct".into(),
            reason: "Terminal growth must not exceed initial growth for a decaying schedule"
                .into(),
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(EquityValuationError::InvalidInputs(errors)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parse_is_case_insensitive() {
        assert_eq!(CompanyProfile::parse("GROWTH"), Some(CompanyProfile::Growth));
        assert_eq!(CompanyProfile::parse(" Madura "), Some(CompanyProfile::Mature));
        assert_eq!(CompanyProfile::parse("CÍCLICA"), Some(CompanyProfile::Cyclical));
        assert_eq!(CompanyProfile::parse("Defensiva"), Some(CompanyProfile::Defensive));
    }

    #[test]
    fn test_profile_resolve_falls_back_to_mature() {
        assert_eq!(CompanyProfile::resolve("startup"), (CompanyProfile::Mature, true));
        assert_eq!(CompanyProfile::resolve("growth"), (CompanyProfile::Growth, false));
    }

    #[test]
    fn test_derived_values() {
        let input = FinancialInput::default();
        assert_eq!(input.net_debt(), Some(dec!(200)));
        assert_eq!(input.market_cap(), Some(dec!(2000)));
        assert_eq!(input.enterprise_value(), Some(dec!(2200)));
    }

    #[test]
    fn test_derived_values_out_of_range() {
        let input = FinancialInput {
            share_price: dec!(1000000000000000),
            shares_outstanding: dec!(1000000000000000),
            ..FinancialInput::default()
        };
        assert_eq!(input.market_cap(), None);
        assert_eq!(input.enterprise_value(), None);
        assert_eq!(input.net_debt(), Some(dec!(200)));

        let input = FinancialInput {
            total_debt: Decimal::MAX,
            cash: -Decimal::MAX,
            ..FinancialInput::default()
        };
        assert_eq!(input.net_debt(), None);
        assert_eq!(input.enterprise_value(), None);
    }

    #[test]
    fn test_default_input_passes_guards() {
        assert!(validate_financial_input(&FinancialInput::default()).is_ok());
    }

    #[test]
    fn test_zero_shares_rejected() {
        let input = FinancialInput {
            shares_outstanding: Decimal::ZERO,
            ..FinancialInput::default()
        };
        match validate_financial_input(&input).unwrap_err() {
            EquityValuationError::InvalidInput { field, .. } => {
                assert_eq!(field, "shares_outstanding");
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_multiple_guard_failures_are_aggregated() {
        let input = FinancialInput {
            shares_outstanding: Decimal::ZERO,
            share_price: dec!(-1),
            terminal_growth_pct: dec!(12),
            ..FinancialInput::default()
        };
        match validate_financial_input(&input).unwrap_err() {
            EquityValuationError::InvalidInputs(errors) => assert_eq!(errors.len(), 3),
            e => panic!("Expected InvalidInputs, got {e:?}"),
        }
    }

    #[test]
    fn test_terminal_equal_to_initial_allowed() {
        let input = FinancialInput {
            initial_growth_pct: dec!(3),
            terminal_growth_pct: dec!(3),
            ..FinancialInput::default()
        };
        assert!(validate_financial_input(&input).is_ok());
    }

    #[test]
    fn test_from_json_reads_string_decimals() {
        let json = serde_json::to_string(&FinancialInput::default()).unwrap();
        let parsed = FinancialInput::from_json(&json).unwrap();
        assert_eq!(parsed, FinancialInput::default());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
company_profile: growth
revenue: "500"
ebitda: "50"
free_cash_flow: "30"
total_debt: "0"
cash: "10"
share_price: "12.5"
shares_outstanding: "40"
net_equity: "200"
total_assets: "400"
net_income: "20"
conservative_growth_pct: "1"
base_growth_pct: "2"
optimistic_growth_pct: "3"
initial_growth_pct: "15"
terminal_growth_pct: "2.5"
"#;
        let parsed = FinancialInput::from_yaml(yaml).unwrap();
        assert_eq!(parsed.company_profile, "growth");
        assert_eq!(parsed.share_price, dec!(12.5));
        assert_eq!(parsed.net_debt(), Some(dec!(-10)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = FinancialInput::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EquityValuationError::SerializationError(_)));
    }
}
