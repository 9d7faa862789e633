use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use time::{macros::format_description, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{error::AppError, scope::Scope, state::AppState};

use super::{
    dto::{DailySummary, SaveMealRequest, WeeklySummary},
    ledger::{MealRecord, NewMeal},
    rollup,
};

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<Vec<MealRecord>>, AppError> {
    let mut records = state.ledger.list_all(&scope).await?;
    // Backends return any order; display order is newest first.
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(records))
}

#[instrument(skip(state, payload))]
pub async fn save_meal(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Json(payload): Json<SaveMealRequest>,
) -> Result<(StatusCode, Json<MealRecord>), AppError> {
    let now = OffsetDateTime::now_utc().to_offset(state.config.utc_offset());
    let label_format = format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");

    let meal = NewMeal {
        timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
        date: now.format(&label_format).unwrap_or_default(),
        ingredients: payload.ingredients,
        totals: payload.totals,
    };

    let record = state.ledger.append(&scope, meal).await?;
    info!(meal_id = %record.id, "meal saved");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ledger.remove(&scope, id).await?;
    info!(meal_id = %id, "meal deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Long-poll for ledger changes. On a push-capable backend this parks until
/// the next mutation (or the poll window closes) and answers with the fresh
/// record set; on polling backends it degrades to a plain list. The
/// subscription is dropped when the request ends, so nothing leaks.
#[instrument(skip(state))]
pub async fn watch_meals(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<Vec<MealRecord>>, AppError> {
    const POLL_WINDOW: std::time::Duration = std::time::Duration::from_secs(25);

    let Some(mut subscription) = state.ledger.subscribe(&scope) else {
        let mut records = state.ledger.list_all(&scope).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        return Ok(Json(records));
    };

    match tokio::time::timeout(POLL_WINDOW, subscription.next()).await {
        Ok(Some(mut records)) => {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(Json(records))
        }
        Ok(None) => Err(AppError::Internal(anyhow::anyhow!("ledger feed closed"))),
        Err(_) => {
            // Nothing changed inside the window; answer with the current set.
            let mut records = state.ledger.list_all(&scope).await?;
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(Json(records))
        }
    }
}

#[instrument(skip(state))]
pub async fn today_summary(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<DailySummary>, AppError> {
    let offset = state.config.utc_offset();
    let today = OffsetDateTime::now_utc().to_offset(offset).date();

    let records = state.ledger.list_all(&scope).await?;
    let totals = rollup::daily_totals(&records, today, offset);
    let goals = state.goals.load(&scope).await?;

    let date_format = format_description!("[day]/[month]/[year]");
    Ok(Json(DailySummary {
        date: today.format(&date_format).unwrap_or_default(),
        totals,
        goals,
    }))
}

#[instrument(skip(state))]
pub async fn week_summary(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<WeeklySummary>, AppError> {
    let offset = state.config.utc_offset();
    let today = OffsetDateTime::now_utc().to_offset(offset).date();

    let records = state.ledger.list_all(&scope).await?;
    Ok(Json(WeeklySummary {
        days: rollup::weekly_series(&records, today, offset),
    }))
}
