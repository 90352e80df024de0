use serde_json::Value;
use std::io;

use super::table::{flatten_into, format_value};

/// Write the result as two-column CSV (field, value) to stdout.
///
/// Nested records are flattened to dotted field names; lists such as the
/// projection years are written as JSON in a single cell.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let _ = wtr.write_record(["field", "value"]);
    for (field, val) in csv_rows(value) {
        let _ = wtr.write_record([field.as_str(), val.as_str()]);
    }
    let _ = wtr.flush();
}

fn csv_rows(value: &Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            flatten_into("", body, &mut rows);
            if let Some(Value::Array(warnings)) = map.get("warnings") {
                for (i, w) in warnings.iter().enumerate() {
                    rows.push((format!("warnings.{i}"), format_value(w)));
                }
            }
        }
        other => rows.push(("value".to_string(), format_value(other))),
    }
    rows
}
