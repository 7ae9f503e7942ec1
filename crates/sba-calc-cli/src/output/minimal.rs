use serde_json::Value;

/// The headline figure for each command, checked in order.
const PRIORITY_KEYS: [&str; 10] = [
    "monthly_payment",
    "apr",
    "guaranty_fee",
    "dscr",
    "max_monthly_payment",
    "minimum_ebitda",
    "value_at_risk",
    "total",
    "difference",
    "id",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields, then falls back to the first field of
/// the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let hit = PRIORITY_KEYS
            .iter()
            .filter_map(|k| map.get(*k))
            .find(|v| !v.is_null());
        if let Some(val) = hit {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(items) = result_obj {
        for item in items {
            let id = item.get("id").unwrap_or(item);
            println!("{}", format_minimal(id));
        }
        return;
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
