use serde::Deserialize;
use serde_json::Value;

use crate::nutrition::normalize::normalize;

use super::store::GoalProfile;

/// Goal inputs arrive as whatever the settings form held, so the fields stay
/// untyped and go through the numeric normalizer. A field that does not come
/// out as a positive number falls back to its default.
#[derive(Debug, Deserialize)]
pub struct SaveGoalsRequest {
    #[serde(default)]
    pub calories: Value,
    #[serde(default)]
    pub protein: Value,
    #[serde(default)]
    pub carbs: Value,
    #[serde(default)]
    pub fats: Value,
    #[serde(default)]
    pub fibers: Value,
}

impl SaveGoalsRequest {
    pub fn sanitize(&self) -> GoalProfile {
        let defaults = GoalProfile::default();
        GoalProfile {
            calories: positive_or(normalize(&self.calories), defaults.calories),
            protein: positive_or(normalize(&self.protein), defaults.protein),
            carbs: positive_or(normalize(&self.carbs), defaults.carbs),
            fats: positive_or(normalize(&self.fats), defaults.fats),
            fibers: positive_or(normalize(&self.fibers), defaults.fibers),
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_field_values_are_normalized() {
        let request = SaveGoalsRequest {
            calories: json!("2200 kcal"),
            protein: json!(160),
            carbs: json!("220"),
            fats: json!(75.5),
            fibers: json!("28"),
        };
        let profile = request.sanitize();
        assert_eq!(profile.calories, 2200.0);
        assert_eq!(profile.protein, 160.0);
        assert_eq!(profile.carbs, 220.0);
        assert_eq!(profile.fats, 75.5);
        assert_eq!(profile.fibers, 28.0);
    }

    #[test]
    fn empty_or_zero_fields_fall_back_to_defaults() {
        let request = SaveGoalsRequest {
            calories: json!(""),
            protein: json!(0),
            carbs: Value::Null,
            fats: json!("abc"),
            fibers: json!(42),
        };
        let profile = request.sanitize();
        assert_eq!(profile.calories, 2000.0);
        assert_eq!(profile.protein, 150.0);
        assert_eq!(profile.carbs, 200.0);
        assert_eq!(profile.fats, 70.0);
        assert_eq!(profile.fibers, 42.0);
    }
}
