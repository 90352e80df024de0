use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use equity_valuation_core::analysis::AnalysisResult;

use super::report::render_analysis_report;

/// Print the envelope as tables.
///
/// A full analysis gets the sectioned report; every other result is shown
/// as a field/value table with nested records flattened to dotted keys.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        println!("{value}");
        return;
    };
    let Some(result) = envelope.get("result") else {
        println!("{}", field_table(envelope));
        return;
    };

    if let Ok(analysis) = serde_json::from_value::<AnalysisResult>(result.clone()) {
        let market_price = envelope
            .get("assumptions")
            .and_then(|a| a.get("share_price"))
            .and_then(decimal_of);
        match render_analysis_report(&analysis, market_price) {
            Ok(report) => print!("{report}"),
            Err(e) => eprintln!("could not render report: {e}"),
        }
    } else {
        if let Value::Object(res_map) = result {
            println!("{}", field_table(res_map));
        } else {
            println!("{}", format_value(result));
        }
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings.iter().filter_map(Value::as_str) {
                    println!("  - {w}");
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn field_table(map: &Map<String, Value>) -> Table {
    let mut rows: Vec<(String, String)> = Vec::new();
    flatten_into("", map, &mut rows);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    Table::from(builder)
}

/// Nested objects become `parent.child` rows.
pub(crate) fn flatten_into(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&full, inner, rows),
            other => rows.push((full, format_value(other))),
        }
    }
}

/// Decimals travel as strings in the envelope.
fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
