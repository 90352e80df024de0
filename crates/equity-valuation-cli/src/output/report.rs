use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::fmt::{self, Write};
use tabled::{builder::Builder, Table};

use equity_valuation_core::analysis::AnalysisResult;
use equity_valuation_core::scoring::{
    DCF_VS_MARKET_MAX, FINANCIAL_RISK_MAX, PROFITABILITY_MAX, TOTAL_MAX, VALUATION_MAX,
};

const NOT_AVAILABLE: &str = "N/A";

/// Two decimals, or N/A when undefined.
pub fn fmt_amount(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!(
            "{:.2}",
            v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// A rate shown as a percentage with two decimals.
pub fn fmt_rate(value: Option<Decimal>) -> String {
    match value {
        Some(v) => match v.checked_mul(dec!(100)) {
            Some(pct) => format!("{}%", fmt_amount(Some(pct))),
            None => NOT_AVAILABLE.to_string(),
        },
        None => NOT_AVAILABLE.to_string(),
    }
}

/// A value already expressed in percent.
pub fn fmt_pct(value: Decimal) -> String {
    format!("{}%", fmt_amount(Some(value)))
}

fn table(rows: Vec<[String; 2]>, header: [&str; 2]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    Table::from(builder).to_string()
}

/// Human-readable report of a full analysis.
///
/// `market_price` comes from the echoed input and is N/A when the envelope
/// did not carry it.
pub fn render_analysis_report(
    result: &AnalysisResult,
    market_price: Option<Decimal>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, result, market_price)?;
    Ok(out)
}

fn write_report(
    out: &mut String,
    result: &AnalysisResult,
    market_price: Option<Decimal>,
) -> fmt::Result {
    // --- WACC ---
    let w = &result.wacc;
    writeln!(out, "== Discount rate (WACC) ==")?;
    writeln!(
        out,
        "{}",
        table(
            vec![
                ["Profile".into(), w.profile.to_string()],
                ["Base rate".into(), fmt_rate(Some(w.base_rate))],
                ["Leverage surcharge".into(), fmt_rate(Some(w.leverage_surcharge))],
                ["Net debt / EBITDA".into(), fmt_amount(w.net_debt_to_ebitda)],
                ["WACC".into(), fmt_rate(Some(w.wacc))],
            ],
            ["Item", "Value"],
        )
    )?;
    for line in &w.justification {
        writeln!(out, "  - {line}")?;
    }

    // --- Ratios ---
    let r = &result.ratios.ratios;
    writeln!(out, "\n== Ratios ==")?;
    writeln!(
        out,
        "{}",
        table(
            vec![
                ["Market cap".into(), fmt_amount(r.market_cap)],
                ["Net debt".into(), fmt_amount(r.net_debt)],
                ["Enterprise value".into(), fmt_amount(r.enterprise_value)],
                ["PER".into(), fmt_amount(r.per)],
                ["PSR".into(), fmt_amount(r.psr)],
                ["EBITDA margin".into(), fmt_rate(r.ebitda_margin)],
                ["EV/EBITDA".into(), fmt_amount(r.ev_ebitda)],
                ["EV/FCF".into(), fmt_amount(r.ev_fcf)],
                ["ROE".into(), fmt_rate(r.roe)],
                ["ROA".into(), fmt_rate(r.roa)],
                ["Net debt / EBITDA".into(), fmt_amount(r.net_debt_to_ebitda)],
            ],
            ["Ratio", "Value"],
        )
    )?;
    let notes = &result.ratios.notes;
    for (title, lines) in [
        ("Valuation", &notes.valuation),
        ("Profitability", &notes.profitability),
        ("Solvency", &notes.solvency),
        ("Cash-flow quality", &notes.cash_flow_quality),
    ] {
        if !lines.is_empty() {
            writeln!(out, "{title}: {}", lines.join(" "))?;
        }
    }

    // --- Perpetuity DCF ---
    writeln!(out, "\n== Perpetuity DCF ==")?;
    let mut builder = Builder::default();
    builder.push_record(["Scenario", "g", "WACC", "EV", "Equity", "Price/share"]);
    for s in &result.perpetuity_dcf.scenarios {
        let (ev, equity, price) = match &s.outcome {
            Ok(v) => (
                fmt_amount(Some(v.enterprise_value)),
                fmt_amount(Some(v.equity_value)),
                fmt_amount(Some(v.price_per_share)),
            ),
            Err(e) => (format!("error: {e}"), NOT_AVAILABLE.into(), NOT_AVAILABLE.into()),
        };
        builder.push_record([
            s.scenario.to_string(),
            fmt_rate(Some(s.growth_rate)),
            fmt_rate(Some(s.discount_rate)),
            ev,
            equity,
            price,
        ]);
    }
    writeln!(out, "{}", Table::from(builder))?;
    if let Some(class) = result.perpetuity_dcf.market_classification {
        writeln!(out, "Market vs base scenario: {class}")?;
    }

    // --- Projection DCF ---
    writeln!(out, "\n== 5-year projection DCF ==")?;
    match &result.projection_dcf.outcome {
        Ok(p) => {
            let schedule: Vec<String> = p.growth_schedule_pct.iter().map(|g| fmt_pct(*g)).collect();
            writeln!(out, "Growth schedule: {}", schedule.join(", "))?;

            let mut builder = Builder::default();
            builder.push_record(["Year", "Growth", "FCF", "Discount factor", "PV"]);
            for y in &p.years {
                builder.push_record([
                    y.year.to_string(),
                    fmt_pct(y.growth_pct),
                    fmt_amount(Some(y.fcf)),
                    format!("{:.4}", y.discount_factor.round_dp(4)),
                    fmt_amount(Some(y.present_value)),
                ]);
            }
            writeln!(out, "{}", Table::from(builder))?;
            writeln!(
                out,
                "{}",
                table(
                    vec![
                        ["Terminal value".into(), fmt_amount(Some(p.terminal_value))],
                        ["PV of terminal value".into(), fmt_amount(Some(p.pv_terminal_value))],
                        ["Terminal weight".into(), fmt_rate(Some(p.terminal_weight))],
                        ["Enterprise value".into(), fmt_amount(Some(p.enterprise_value))],
                        ["Equity value".into(), fmt_amount(Some(p.equity_value))],
                        ["Price/share".into(), fmt_amount(Some(p.price_per_share))],
                    ],
                    ["Item", "Value"],
                )
            )?;
            if let Some(class) = p.market_classification {
                writeln!(out, "Market vs projection: {class}")?;
            }
        }
        Err(e) => {
            writeln!(out, "Projection not available: {e}")?;
        }
    }

    // --- Price comparison ---
    writeln!(out, "\n== Price per share ==")?;
    writeln!(
        out,
        "{}",
        table(
            vec![
                ["Market".into(), fmt_amount(market_price)],
                ["Perpetuity DCF (base)".into(), fmt_amount(result.perpetuity_dcf.base_price)],
                ["Projection DCF".into(), fmt_amount(result.projection_dcf.price_per_share())],
            ],
            ["Source", "Price"],
        )
    )?;

    // --- Score ---
    let s = &result.score;
    writeln!(out, "\n== Investment score ==")?;
    writeln!(
        out,
        "{}",
        table(
            vec![
                ["Valuation".into(), format!("{}/{VALUATION_MAX}", s.valuation)],
                ["Profitability".into(), format!("{}/{PROFITABILITY_MAX}", s.profitability)],
                ["Financial risk".into(), format!("{}/{FINANCIAL_RISK_MAX}", s.financial_risk)],
                ["DCF vs market".into(), format!("{}/{DCF_VS_MARKET_MAX}", s.dcf_vs_market)],
                ["Total".into(), format!("{}/{TOTAL_MAX}", s.total)],
                ["Recommendation".into(), s.recommendation.to_string()],
            ],
            ["Block", "Score"],
        )
    )?;

    // --- Conclusions ---
    writeln!(out, "\nPreliminary verdict: {}", result.preliminary_verdict)?;
    if let Some(note) = &result.dcf_comparison_note {
        writeln!(out, "{note}")?;
    }
    if result.warnings.is_empty() {
        writeln!(out, "No critical warnings.")?;
    } else {
        writeln!(out, "Warnings:")?;
        for w in &result.warnings {
            writeln!(out, "  - {w}")?;
        }
    }

    Ok(())
}
