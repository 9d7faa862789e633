use serde_json::Value;

/// Coerce whatever the model put in a nutrient field into a definite,
/// finite, non-negative number. This function has no failure mode: the model
/// output is untrusted and a single bad field must never abort aggregation,
/// so anything unusable degrades to zero.
///
/// Strings are stripped down to ASCII digits and `.` before parsing, which
/// turns "20g", "20 g" and "≈ 15 kcal" into plain numbers.
pub fn normalize(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0),
        Value::String(s) => {
            let clean: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            clean
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
