use serde::Serialize;
use serde_json::Value;

use crate::{ai::CompletionClient, error::AppError, meals::ledger::Ingredient};

use super::{
    aggregate::{aggregate, Totals},
    extract::{extract, LineItem},
    normalize::normalize,
};

/// A line item with its nutrient fields already normalized, the shape the
/// API hands back next to the totals.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EstimatedItem {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

impl From<&LineItem> for EstimatedItem {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            calories: normalize(&item.calories),
            protein: normalize(&item.protein),
            carbs: normalize(&item.carbs),
            fats: normalize(&item.fats),
            fiber: normalize(&item.fiber),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Estimate {
    pub items: Vec<EstimatedItem>,
    pub totals: Totals,
}

/// Render the model instruction. The format demand is strict on purpose;
/// the extractor still tolerates fences and prose when the model ignores it.
pub fn build_prompt(ingredients: &[Ingredient]) -> String {
    let mut lines = String::new();
    for ingredient in ingredients {
        let quantity = match &ingredient.quantity {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        lines.push_str(&format!(
            "- {} {} {}\n",
            quantity.trim(),
            ingredient.unit.trim(),
            ingredient.name.trim()
        ));
    }

    format!(
        "You are a technical nutritionist. Analyze the ingredients below and \
         return ONLY a raw JSON array.\n\
         Do NOT use markdown (no ```json). Do NOT explain anything.\n\
         Exact required format:\n\
         [\n    {{\n        \"name\": \"Ingredient name\",\n        \"calories\": 0,\n        \
         \"protein\": 0,\n        \"carbs\": 0,\n        \"fats\": 0,\n        \"fiber\": 0\n    }}\n]\n\
         Use numbers (integers or decimals) for the macros.\n\n\
         Ingredients to analyze:\n{lines}"
    )
}

/// The whole estimation flow: prompt, one model call, tolerant extraction,
/// aggregation. Errors propagate untouched so the caller keeps its buffer
/// and can retry.
pub async fn estimate(
    model: &dyn CompletionClient,
    ingredients: &[Ingredient],
) -> Result<Estimate, AppError> {
    let prompt = build_prompt(ingredients);
    let raw = model.complete(&prompt).await?;
    let items = extract(&raw)?;
    let totals = aggregate(&items);
    Ok(Estimate {
        items: items.iter().map(EstimatedItem::from).collect(),
        totals,
    })
}
