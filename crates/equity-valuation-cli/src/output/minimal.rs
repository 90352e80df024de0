use serde_json::Value;

/// Key answer of each command, most specific first.
const PRIORITY_POINTERS: [&str; 6] = [
    "/score/total",
    "/total",
    "/perpetuity/base_price",
    "/verdict",
    "/wacc",
    "/enterprise_value",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for pointer in PRIORITY_POINTERS {
        if let Some(val) = result_obj.pointer(pointer) {
            if !val.is_null() && !val.is_object() {
                return with_recommendation(result_obj, format_minimal(val));
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

/// Scores read better with their recommendation attached.
fn with_recommendation(result: &Value, answer: String) -> String {
    let recommendation = result
        .pointer("/score/recommendation")
        .or_else(|| result.pointer("/recommendation"))
        .and_then(Value::as_str);
    match recommendation {
        Some(r) => format!("{answer} {r}"),
        None => answer,
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analysis_prints_score_and_recommendation() {
        let envelope = json!({"result": {"wacc": {"wacc": "0.08"}, "score": {"total": 79, "recommendation": "Buy"}}});
        assert_eq!(minimal_answer(&envelope), "79 Buy");
    }

    #[test]
    fn test_wacc_prints_rate() {
        let envelope = json!({"result": {"wacc": "0.08", "profile": "madura"}});
        assert_eq!(minimal_answer(&envelope), "0.08");
    }

    #[test]
    fn test_dcf_without_base_price_falls_through() {
        let envelope = json!({"result": {"wacc": "0.09", "perpetuity": {"base_price": null}}});
        assert_eq!(minimal_answer(&envelope), "0.09");
    }
}
