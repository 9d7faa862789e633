use serde::{Deserialize, Serialize};

use super::{extract::LineItem, normalize::normalize};

/// Field-wise nutrient sums. Always derived, never user-edited; every field
/// is finite and non-negative because values only enter through `normalize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

/// Sum a set of line items into totals. Order-independent and non-mutating;
/// an empty slice yields all zeros.
pub fn aggregate(items: &[LineItem]) -> Totals {
    let mut totals = Totals::default();
    for item in items {
        totals.calories += normalize(&item.calories);
        totals.protein += normalize(&item.protein);
        totals.carbs += normalize(&item.carbs);
        totals.fats += normalize(&item.fats);
        totals.fiber += normalize(&item.fiber);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(name: &str, values: [serde_json::Value; 5]) -> LineItem {
        let [calories, protein, carbs, fats, fiber] = values;
        LineItem {
            name: name.into(),
            calories,
            protein,
            carbs,
            fats,
            fiber,
        }
    }

    #[test]
    fn empty_input_yields_all_zero_totals() {
        assert_eq!(aggregate(&[]), Totals::default());
    }

    #[test]
    fn mixed_numeric_and_string_fields_sum_correctly() {
        let items = vec![
            item("a", [json!(100), json!("10g"), json!(0), json!(0), json!(0)]),
            item("b", [json!("50"), json!(5), json!(10), json!(2), json!(1)]),
        ];
        let totals = aggregate(&items);
        assert_eq!(totals.calories, 150.0);
        assert_eq!(totals.protein, 15.0);
        assert_eq!(totals.carbs, 10.0);
        assert_eq!(totals.fats, 2.0);
        assert_eq!(totals.fiber, 1.0);
    }

    #[test]
    fn summation_is_order_independent() {
        let a = item("a", [json!(12.5), json!(1), json!(2), json!(3), json!(4)]);
        let b = item("b", [json!("7"), json!(0.5), json!(1.5), json!(0), json!(2)]);
        let c = item("c", [json!(null), json!("3g"), json!(0), json!(1), json!(0)]);

        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]);
        let backward = aggregate(&[c, b, a]);

        assert!((forward.calories - backward.calories).abs() < 1e-9);
        assert!((forward.protein - backward.protein).abs() < 1e-9);
        assert!((forward.carbs - backward.carbs).abs() < 1e-9);
        assert!((forward.fats - backward.fats).abs() < 1e-9);
        assert!((forward.fiber - backward.fiber).abs() < 1e-9);
    }

    #[test]
    fn malformed_fields_contribute_zero_without_aborting() {
        let items = vec![
            item("ok", [json!(80), json!(4), json!(6), json!(1), json!(0)]),
            item(
                "broken",
                [json!("n/a"), json!(null), json!(true), json!([1]), json!(-3)],
            ),
        ];
        let totals = aggregate(&items);
        assert_eq!(totals.calories, 80.0);
        assert_eq!(totals.protein, 4.0);
        assert_eq!(totals.carbs, 6.0);
        assert_eq!(totals.fats, 1.0);
        assert_eq!(totals.fiber, 0.0);
    }

    #[test]
    fn input_items_are_not_mutated() {
        let items = vec![item(
            "a",
            [json!("20g"), json!(1), json!(2), json!(3), json!(4)],
        )];
        let before = items.clone();
        let _ = aggregate(&items);
        assert_eq!(items, before);
    }
}
