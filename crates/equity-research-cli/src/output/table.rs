use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

const SCENARIO_KEYS: [&str; 3] = ["bull", "base", "bear"];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) if SCENARIO_KEYS.iter().all(|k| res_map.contains_key(*k)) => {
            print_scenario_table(res_map);
        }
        Value::Object(res_map) => print_sections(res_map),
        _ => print_flat_object(envelope),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars first, then one titled table per nested object or row array.
fn print_sections(map: &Map<String, Value>) {
    let scalars: Map<String, Value> = map
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !scalars.is_empty() {
        print_flat_object(&scalars);
    }

    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                println!("\n{}:", title(key));
                print_flat_object(inner);
            }
            Value::Array(rows) => {
                println!("\n{}:", title(key));
                print_array_table(rows);
            }
            _ => {}
        }
    }
}

fn print_scenario_table(map: &Map<String, Value>) {
    let columns = [
        "value_per_share",
        "enterprise_value",
        "equity_value",
        "upside_pct",
    ];
    let mut builder = Builder::default();
    builder.push_record(["Case", "Value/Share", "Enterprise Value", "Equity Value", "Upside %"]);
    for key in SCENARIO_KEYS {
        if let Some(case) = map.get(key) {
            let label = case
                .get("label")
                .map(format_value)
                .unwrap_or_else(|| key.to_string());
            let mut row = vec![label];
            for col in &columns {
                row.push(case.get(*col).map(format_value).unwrap_or_default());
            }
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn title(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
