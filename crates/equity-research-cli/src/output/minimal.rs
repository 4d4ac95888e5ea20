use serde_json::Value;

/// Scenario cases in display order
const SCENARIO_KEYS: [&str; 3] = ["bull", "base", "bear"];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, descending into
/// the LBO `returns` block, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        // Scenario set: one line per case
        if SCENARIO_KEYS.iter().all(|k| map.contains_key(*k)) {
            for key in SCENARIO_KEYS {
                let vps = map
                    .get(key)
                    .and_then(|c| c.get("value_per_share"))
                    .map(format_minimal)
                    .unwrap_or_default();
                println!("{}: {}", key, vps);
            }
            return;
        }

        let map = match map.get("returns") {
            Some(Value::Object(returns)) => returns,
            _ => map,
        };

        let priority_keys = [
            "value_per_share",
            "irr",
            "moic",
            "upside_pct",
            "enterprise_value",
            "equity_value",
        ];
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
