use serde_json::{Map, Value};
use std::io;

const SCENARIO_KEYS: [&str; 3] = ["bull", "base", "bear"];

/// Write output as CSV to stdout.
///
/// Year-by-year projections are written as a grid when present, scenario
/// sets as one row per case, anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result))
                if SCENARIO_KEYS.iter().all(|k| result.contains_key(*k)) =>
            {
                write_scenarios_csv(&mut wtr, result);
            }
            Some(Value::Object(result)) => {
                if let Some(Value::Array(rows)) = result.get("projections") {
                    write_array_csv(&mut wtr, rows);
                } else {
                    write_pairs_csv(&mut wtr, result);
                }
            }
            _ => write_pairs_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_pairs_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_scenarios_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let columns = [
        "value_per_share",
        "enterprise_value",
        "equity_value",
        "upside_pct",
    ];
    let _ = wtr.write_record(
        std::iter::once("case").chain(columns.iter().copied()),
    );
    for key in SCENARIO_KEYS {
        if let Some(case) = map.get(key) {
            let mut row = vec![key.to_string()];
            for col in &columns {
                row.push(case.get(*col).map(format_csv_value).unwrap_or_default());
            }
            let _ = wtr.write_record(&row);
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
