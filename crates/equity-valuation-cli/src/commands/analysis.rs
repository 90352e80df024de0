use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_valuation_core::analysis;
use equity_valuation_core::input::validate_financial_input;
use equity_valuation_core::FinancialInput;

use crate::input;

/// Company figures shared by every subcommand.
///
/// Unset flags take the defaults of `FinancialInput::default()`.
#[derive(Args, Debug, Default)]
#[command(allow_hyphen_values = true)]
pub struct FinancialArgs {
    /// Company profile: growth, madura, defensiva or cíclica
    #[arg(long)]
    pub profile: Option<String>,

    /// Revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// EBITDA
    #[arg(long)]
    pub ebitda: Option<Decimal>,

    /// Free cash flow
    #[arg(long, alias = "free-cash-flow")]
    pub fcf: Option<Decimal>,

    /// Total financial debt
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Cash and equivalents
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Current share price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Shares outstanding
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Book value of equity
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Total assets
    #[arg(long)]
    pub assets: Option<Decimal>,

    /// Net income
    #[arg(long)]
    pub net_income: Option<Decimal>,

    /// Perpetual growth, conservative scenario (percent, e.g. 1.5)
    #[arg(long)]
    pub growth_conservative: Option<Decimal>,

    /// Perpetual growth, base scenario (percent)
    #[arg(long)]
    pub growth_base: Option<Decimal>,

    /// Perpetual growth, optimistic scenario (percent)
    #[arg(long)]
    pub growth_optimistic: Option<Decimal>,

    /// First-year growth of the five-year projection (percent)
    #[arg(long)]
    pub initial_growth: Option<Decimal>,

    /// Terminal growth of the five-year projection (percent)
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

impl FinancialArgs {
    /// Input file, then piped JSON, then flags over the defaults.
    pub fn read(self) -> Result<FinancialInput, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_financial_input(path);
        }
        if let Some(from_stdin) = input::stdin::read_stdin()? {
            return Ok(from_stdin);
        }
        Ok(self.apply_to(FinancialInput::default()))
    }

    /// Read the input and apply the collector guards.
    pub fn load(self) -> Result<FinancialInput, Box<dyn std::error::Error>> {
        let input = self.read()?;
        validate_financial_input(&input)?;
        Ok(input)
    }

    fn apply_to(self, base: FinancialInput) -> FinancialInput {
        FinancialInput {
            company_profile: self.profile.unwrap_or(base.company_profile),
            revenue: self.revenue.unwrap_or(base.revenue),
            ebitda: self.ebitda.unwrap_or(base.ebitda),
            free_cash_flow: self.fcf.unwrap_or(base.free_cash_flow),
            total_debt: self.debt.unwrap_or(base.total_debt),
            cash: self.cash.unwrap_or(base.cash),
            share_price: self.price.unwrap_or(base.share_price),
            shares_outstanding: self.shares.unwrap_or(base.shares_outstanding),
            net_equity: self.equity.unwrap_or(base.net_equity),
            total_assets: self.assets.unwrap_or(base.total_assets),
            net_income: self.net_income.unwrap_or(base.net_income),
            conservative_growth_pct: self
                .growth_conservative
                .unwrap_or(base.conservative_growth_pct),
            base_growth_pct: self.growth_base.unwrap_or(base.base_growth_pct),
            optimistic_growth_pct: self
                .growth_optimistic
                .unwrap_or(base.optimistic_growth_pct),
            initial_growth_pct: self.initial_growth.unwrap_or(base.initial_growth_pct),
            terminal_growth_pct: self.terminal_growth.unwrap_or(base.terminal_growth_pct),
        }
    }
}

pub fn run_analyze(args: FinancialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = args.read()?;
    tracing::info!(profile = %input.company_profile, "running equity analysis");
    let result = analysis::analyze(&input)?;
    Ok(serde_json::to_value(result)?)
}
