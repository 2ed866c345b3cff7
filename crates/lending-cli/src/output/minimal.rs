use serde_json::Value;

use super::render_scalar;

/// Key output fields, in the order a caller most likely wants just one of.
const PRIORITY_KEYS: [&str; 6] = [
    "installment_amount",
    "suggested_amount",
    "suggested_principal",
    "monthly_rate",
    "max_installment",
    "total_payable",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", render_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, render_scalar(val));
            return;
        }
    }

    println!("{}", render_scalar(result_obj));
}
