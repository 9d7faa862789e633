use serde::Deserialize;

use crate::meals::ledger::Ingredient;

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}
