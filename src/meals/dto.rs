use serde::{Deserialize, Serialize};

use crate::{goals::GoalProfile, nutrition::Totals};

use super::{ledger::Ingredient, rollup::DayCalories};

/// A calculated meal the client wants committed. The totals are the snapshot
/// produced by the calculate flow; the server stamps time and id.
#[derive(Debug, Deserialize)]
pub struct SaveMealRequest {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    pub totals: Totals,
}

/// Dashboard payload: today's consumption next to the scope's targets.
#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub totals: Totals,
    pub goals: GoalProfile,
}

#[derive(Debug, Serialize)]
pub struct WeeklySummary {
    pub days: Vec<DayCalories>,
}
