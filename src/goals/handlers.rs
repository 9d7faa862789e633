use axum::{extract::State, Json};
use tracing::{info, instrument};

use crate::{error::AppError, scope::Scope, state::AppState};

use super::{dto::SaveGoalsRequest, store::GoalProfile};

#[instrument(skip(state))]
pub async fn get_goals(
    State(state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<GoalProfile>, AppError> {
    Ok(Json(state.goals.load(&scope).await?))
}

#[instrument(skip(state, payload))]
pub async fn put_goals(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Json(payload): Json<SaveGoalsRequest>,
) -> Result<Json<GoalProfile>, AppError> {
    let profile = payload.sanitize();
    state.goals.save(&scope, &profile).await?;
    info!(calories = profile.calories, "goals saved");
    Ok(Json(profile))
}
