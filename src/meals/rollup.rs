use serde::Serialize;
use time::{macros::format_description, Date, Duration, OffsetDateTime, UtcOffset};

use crate::nutrition::Totals;

use super::ledger::MealRecord;

/// One bar of the weekly calories series.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCalories {
    pub label: String,
    pub calories: f64,
}

/// Calendar date a record falls on, in the configured offset. Grouping is by
/// calendar date, not a rolling 24-hour window, to match the "today" /
/// "this week" mental model.
fn record_date(record: &MealRecord, offset: UtcOffset) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(record.timestamp) * 1_000_000)
        .ok()
        .map(|dt| dt.to_offset(offset).date())
}

/// Sum the stored totals of every record on `reference`'s calendar date.
/// Totals are summed as persisted; history is never re-derived from
/// ingredients.
pub fn daily_totals(records: &[MealRecord], reference: Date, offset: UtcOffset) -> Totals {
    let mut totals = Totals::default();
    for record in records {
        if record_date(record, offset) == Some(reference) {
            totals.calories += record.totals.calories;
            totals.protein += record.totals.protein;
            totals.carbs += record.totals.carbs;
            totals.fats += record.totals.fats;
            totals.fiber += record.totals.fiber;
        }
    }
    totals
}

/// Calories per day for the 7 calendar days ending at `reference` inclusive,
/// zero-filled and ordered oldest first.
pub fn weekly_series(records: &[MealRecord], reference: Date, offset: UtcOffset) -> Vec<DayCalories> {
    let label_format = format_description!("[day]/[month]");
    let mut series = Vec::with_capacity(7);
    for back in (0..7i64).rev() {
        let Some(day) = reference.checked_sub(Duration::days(back)) else {
            continue;
        };
        let calories = records
            .iter()
            .filter(|r| record_date(r, offset) == Some(day))
            .map(|r| r.totals.calories)
            .sum();
        series.push(DayCalories {
            label: day.format(&label_format).unwrap_or_default(),
            calories,
        });
    }
    series
}
