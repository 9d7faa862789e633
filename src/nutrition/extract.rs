use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// One ingredient's estimated nutrition as the model reported it. The
/// nutrient fields stay untyped here: missing or unit-suffixed values are
/// tolerated at this stage and only become numbers in the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub calories: Value,
    #[serde(default)]
    pub protein: Value,
    #[serde(default)]
    pub carbs: Value,
    #[serde(default)]
    pub fats: Value,
    #[serde(default)]
    pub fiber: Value,
}

/// Pull the line-item array out of a raw model response.
///
/// The model is instructed to emit a bare JSON array but will sometimes wrap
/// it in markdown fences or prose, so this is tolerant recovery rather than
/// strict parsing: fences are stripped and the slice from the first `[` to
/// the last `]` is taken as the candidate array. An empty array is a valid
/// zero-item meal.
pub fn extract(raw: &str) -> Result<Vec<LineItem>, AppError> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('[');
    let end = cleaned.rfind(']');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => {
            return Err(AppError::Parse {
                raw: raw.to_string(),
            })
        }
    };

    serde_json::from_str::<Vec<LineItem>>(candidate).map_err(|_| AppError::Parse {
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_json_roundtrips() {
        let items = vec![
            LineItem {
                name: "rice".into(),
                calories: json!(130),
                protein: json!("2.7g"),
                carbs: json!(28),
                fats: json!(0.3),
                fiber: json!(0.4),
            },
            LineItem {
                name: "chicken breast".into(),
                calories: json!(165),
                protein: json!(31),
                carbs: json!(0),
                fats: json!(3.6),
                fiber: json!(0),
            },
        ];
        let raw = serde_json::to_string(&items).expect("serialize items");
        let parsed = extract(&raw).expect("extract clean json");
        assert_eq!(parsed, items);
    }

    #[test]
    fn fenced_empty_array_is_a_zero_item_meal() {
        let parsed = extract("```json\n[]\n```").expect("extract fenced array");
        assert!(parsed.is_empty());
    }

    #[test]
    fn prose_wrapped_array_is_recovered() {
        let raw = "Here is your breakdown:\n[{\"name\":\"egg\",\"calories\":78,\
                   \"protein\":6,\"carbs\":0.6,\"fats\":5,\"fiber\":0}]\nEnjoy!";
        let parsed = extract(raw).expect("extract wrapped array");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "egg");
    }

    #[test]
    fn missing_nutrient_fields_default_to_null() {
        let parsed = extract(r#"[{"name":"water"}]"#).expect("extract sparse item");
        assert_eq!(parsed[0].name, "water");
        assert_eq!(parsed[0].calories, Value::Null);
        assert_eq!(parsed[0].fiber, Value::Null);
    }

    #[test]
    fn no_array_fails_with_parse_error() {
        let err = extract("no array here").unwrap_err();
        match err {
            AppError::Parse { raw } => assert_eq!(raw, "no array here"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn malformed_array_fails_and_keeps_raw_text() {
        let err = extract("[{\"name\": oops]").unwrap_err();
        match err {
            AppError::Parse { raw } => assert!(raw.contains("oops")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn brackets_in_wrong_order_fail() {
        assert!(extract("] nothing [").is_err());
    }
}
